//! Statistics read models derived from the ball ledger.
//!
//! Everything here is a pure function of `(roster, ledger)`. Scorecards are
//! disposable: drop them and recompute whenever the ledger changes.

pub mod overs;
pub mod scorecard;

pub use overs::{OverSummary, over_summaries};
pub use scorecard::{
    BattingLine, BowlingLine, ExtrasBreakdown, Scorecard, ScorecardProjection, project, rebuild,
};
