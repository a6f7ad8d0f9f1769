//! Scoring domain module (event-driven).
//!
//! This crate contains the rules of a two-innings limited-overs match,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Callers feed ball inputs to [`ScoringEngine`] and receive a
//! tagged [`Decision`] describing what the scorer must do next.

pub mod ball;
pub mod config;
pub mod counter;
pub mod engine;
pub mod innings;
pub mod input;
pub mod ledger;
pub mod outcome;
pub mod result;
pub mod roster;
pub mod snapshot;

pub use ball::{BallEvent, ExtraType, InningsNumber};
pub use config::{MatchConfig, MatchSetup};
pub use counter::{BALLS_PER_OVER, OverCounter};
pub use engine::{MatchCommand, MatchEvent, MatchPhase, ScoringEngine};
pub use innings::{InningsCompletion, InningsState, ScoreSnapshot};
pub use input::{BallInput, MAX_RUNS_PER_DELIVERY};
pub use ledger::BallLedger;
pub use outcome::{BallOutcome, Decision, InningsTransition};
pub use result::{FinalScores, InningsScore, Margin, MatchResult};
pub use roster::{Availability, Lineup, Player, RoleAssignment, Roster, Team, TeamSide};
pub use snapshot::MatchSnapshot;
