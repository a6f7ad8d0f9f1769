use serde::{Deserialize, Serialize};

use crate::innings::InningsState;
use crate::roster::TeamSide;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Margin {
    Runs(u32),
    Wickets(u32),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Won { winner: TeamSide, margin: Margin },
    Tie,
}

impl MatchResult {
    /// Decide the result once the chase is over.
    ///
    /// `wickets_in_hand` is only used when the chasing side wins.
    pub fn decide(first: &InningsState, second: &InningsState, wickets_in_hand: u32) -> Self {
        if second.runs > first.runs {
            MatchResult::Won {
                winner: second.batting_team,
                margin: Margin::Wickets(wickets_in_hand),
            }
        } else if second.runs == first.runs {
            MatchResult::Tie
        } else {
            MatchResult::Won {
                winner: first.batting_team,
                margin: Margin::Runs(first.runs - second.runs),
            }
        }
    }

    pub fn winner(&self) -> Option<TeamSide> {
        match self {
            MatchResult::Won { winner, .. } => Some(*winner),
            MatchResult::Tie => None,
        }
    }
}

/// Summary line for one innings, e.g. `A 142/6 (20.0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsScore {
    pub team: TeamSide,
    pub runs: u32,
    pub wickets: u32,
    pub overs: String,
}

impl From<&InningsState> for InningsScore {
    fn from(innings: &InningsState) -> Self {
        Self {
            team: innings.batting_team,
            runs: innings.runs,
            wickets: innings.wickets,
            overs: innings.counter.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScores {
    pub first: InningsScore,
    pub second: InningsScore,
    pub result: MatchResult,
}
