use serde::{Deserialize, Serialize};

use crate::ball::InningsNumber;
use crate::counter::{BALLS_PER_OVER, OverCounter};
use crate::roster::TeamSide;

/// Why an innings ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsCompletion {
    AllOut,
    OversExhausted,
    TargetReached,
    /// Closed by the scorer through `end_innings`.
    Closed,
}

impl InningsCompletion {
    /// Completions caused by a delivery, which undoing that delivery reverses.
    pub fn is_from_play(self) -> bool {
        self != InningsCompletion::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsState {
    pub number: InningsNumber,
    pub batting_team: TeamSide,
    pub bowling_team: TeamSide,
    pub runs: u32,
    pub wickets: u32,
    pub counter: OverCounter,
    /// Second innings only: first innings runs + 1.
    pub target: Option<u32>,
    pub completion: Option<InningsCompletion>,
}

impl InningsState {
    pub fn first(batting_team: TeamSide) -> Self {
        Self::open(InningsNumber::First, batting_team, None)
    }

    pub fn second(batting_team: TeamSide, target: u32) -> Self {
        Self::open(InningsNumber::Second, batting_team, Some(target))
    }

    fn open(number: InningsNumber, batting_team: TeamSide, target: Option<u32>) -> Self {
        Self {
            number,
            batting_team,
            bowling_team: batting_team.opponent(),
            runs: 0,
            wickets: 0,
            counter: OverCounter::new(),
            target,
            completion: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    pub fn snapshot(&self, overs_per_innings: u32) -> ScoreSnapshot {
        let total_balls = overs_per_innings * BALLS_PER_OVER as u32;
        ScoreSnapshot {
            innings: self.number,
            batting_team: self.batting_team,
            runs: self.runs,
            wickets: self.wickets,
            completed_overs: self.counter.completed_overs(),
            balls_in_over: self.counter.balls_in_over(),
            overs: self.counter.to_string(),
            target: self.target,
            runs_required: self.target.map(|t| t.saturating_sub(self.runs)),
            balls_remaining: total_balls.saturating_sub(self.counter.legal_balls()),
            completion: self.completion,
        }
    }
}

/// Read-only view of the innings score after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub innings: InningsNumber,
    pub batting_team: TeamSide,
    pub runs: u32,
    pub wickets: u32,
    pub completed_overs: u32,
    pub balls_in_over: u8,
    /// Scorebook notation, e.g. `"4.2"`.
    pub overs: String,
    pub target: Option<u32>,
    pub runs_required: Option<u32>,
    pub balls_remaining: u32,
    pub completion: Option<InningsCompletion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_innings_swaps_roles_and_tracks_chase() {
        let mut innings = InningsState::second(TeamSide::B, 50);
        assert_eq!(innings.bowling_team, TeamSide::A);

        innings.runs = 38;
        innings.counter = OverCounter::from_legal_balls(27);
        let snap = innings.snapshot(5);
        assert_eq!(snap.runs_required, Some(12));
        assert_eq!(snap.balls_remaining, 3);
        assert_eq!(snap.overs, "4.3");
    }
}
