use serde::{Deserialize, Serialize};

use axum::http::StatusCode;
use crease_core::{DomainResult, MatchId, PlayerId};
use crease_scoring::{
    BallInput, FinalScores, Lineup, MatchConfig, MatchPhase, MatchResult, MatchSetup,
    RoleAssignment, Roster, ScoreSnapshot, ScoringEngine, Team, TeamSide,
};
use crease_stats::{OverSummary, Scorecard};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    pub name: String,
    pub players: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub team_a: TeamRequest,
    pub team_b: TeamRequest,
    #[serde(default)]
    pub config: MatchConfig,
    #[serde(default = "default_batting_first")]
    pub batting_first: TeamSide,
}

fn default_batting_first() -> TeamSide {
    TeamSide::A
}

impl CreateMatchRequest {
    pub fn into_setup(self) -> DomainResult<MatchSetup> {
        let team = |side, req: TeamRequest| {
            let names: Vec<&str> = req.players.iter().map(String::as_str).collect();
            Team::named(side, req.name, &names)
        };
        let roster = Roster::new(team(TeamSide::A, self.team_a), team(TeamSide::B, self.team_b))?;
        Ok(MatchSetup::new(roster, self.config, self.batting_first))
    }
}

#[derive(Debug, Deserialize)]
pub struct LineupRequest {
    pub striker: PlayerId,
    pub non_striker: Option<PlayerId>,
    pub bowler: PlayerId,
}

impl From<LineupRequest> for Lineup {
    fn from(req: LineupRequest) -> Self {
        Lineup {
            striker: req.striker,
            non_striker: req.non_striker,
            bowler: req.bowler,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallKind {
    Score,
    Dot,
    Wide,
    NoBall,
    Bye,
    LegBye,
    Wicket,
}

/// One delivery as keyed in by the scorer.
///
/// `runs` means runs off the bat for `score`, runs actually run for
/// `wide`/`no_ball` (the penalty is added), and runs taken for byes.
#[derive(Debug, Deserialize)]
pub struct BallRequest {
    pub kind: BallKind,
    pub runs: Option<i32>,
}

impl BallRequest {
    pub fn into_input(self) -> Result<BallInput, axum::response::Response> {
        let required = |kind: &str| {
            self.runs.ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("runs is required for {kind}"),
                )
            })
        };
        Ok(match self.kind {
            BallKind::Score => BallInput::score(required("score")?),
            BallKind::Dot => BallInput::dot(),
            BallKind::Wide => self.runs.map_or_else(BallInput::wide, BallInput::wide_with_runs),
            BallKind::NoBall => BallInput::no_ball(self.runs.unwrap_or(0)),
            BallKind::Bye => BallInput::bye(required("bye")?),
            BallKind::LegBye => BallInput::leg_bye(required("leg_bye")?),
            BallKind::Wicket => BallInput::wicket(),
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MatchCreatedResponse {
    pub match_id: MatchId,
    pub roster: Roster,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub match_id: MatchId,
    pub version: u64,
    pub phase: MatchPhase,
    pub score: ScoreSnapshot,
    pub roles: RoleAssignment,
    pub eligible_batters: Vec<PlayerId>,
    pub result: Option<MatchResult>,
    pub final_scores: Option<FinalScores>,
}

impl From<&ScoringEngine> for MatchView {
    fn from(engine: &ScoringEngine) -> Self {
        use crease_core::AggregateRoot;
        Self {
            match_id: engine.match_id(),
            version: engine.version(),
            phase: engine.phase(),
            score: engine.score(),
            roles: *engine.roles(),
            eligible_batters: engine.eligible_batters(),
            result: engine.result(),
            final_scores: engine.final_scores(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScorecardResponse {
    pub team_a: Scorecard,
    pub team_b: Scorecard,
    /// Overs of the innings in progress (or the last one played).
    pub overs: Vec<OverSummary>,
}
