use serde::{Deserialize, Serialize};

use crease_core::PlayerId;

use crate::ball::BallEvent;
use crate::innings::{InningsCompletion, ScoreSnapshot};
use crate::result::{FinalScores, InningsScore, MatchResult};

/// What the scorer has to do after a delivery.
///
/// Exactly one decision is returned per ball. A wicket that also completes
/// an over carries `bowler_needed`, and the caller selects the incoming
/// batter first, then the bowler for the next over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Continue,
    BowlerNeeded,
    BatsmanNeeded { bowler_needed: bool },
    LastManBatting { player_id: PlayerId, bowler_needed: bool },
    InningsComplete { reason: InningsCompletion },
    MatchComplete { result: MatchResult },
}

impl Decision {
    pub fn needs_bowler(&self) -> bool {
        match self {
            Decision::BowlerNeeded => true,
            Decision::BatsmanNeeded { bowler_needed }
            | Decision::LastManBatting { bowler_needed, .. } => *bowler_needed,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Decision::InningsComplete { .. } | Decision::MatchComplete { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallOutcome {
    pub ball: BallEvent,
    pub score: ScoreSnapshot,
    pub decision: Decision,
}

/// Result of `end_innings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InningsTransition {
    /// Caller must collect the second-innings lineup.
    SecondInningsReady { target: u32, first_innings: InningsScore },
    MatchComplete { scores: FinalScores },
}
