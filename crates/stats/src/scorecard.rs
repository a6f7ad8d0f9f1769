use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crease_core::PlayerId;
use crease_events::{Projection, ProjectionError, ProjectionRunner};
use crease_scoring::{BALLS_PER_OVER, BallEvent, ExtraType, Roster, TeamSide};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingLine {
    pub player_id: PlayerId,
    pub name: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    /// Bowler credited with the dismissal, if out.
    pub dismissed_by: Option<PlayerId>,
    /// Runs per 100 balls faced; 0 before the first ball.
    pub strike_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlingLine {
    pub player_id: PlayerId,
    pub name: String,
    pub balls_bowled: u32,
    pub overs: String,
    /// Every run scored off the bowler, extras included.
    pub runs_conceded: u32,
    pub wickets: u32,
    /// Runs per six legal balls; 0 before the first legal ball.
    pub economy: f64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrasBreakdown {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
    pub total: u32,
}

/// One team's view of the match: its batters, its bowlers, and the extras
/// it received while batting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub team: TeamSide,
    pub batting: Vec<BattingLine>,
    pub bowling: Vec<BowlingLine>,
    pub extras: ExtrasBreakdown,
}

/// Build the scorecard for `team` from the full ledger.
pub fn project(roster: &Roster, balls: &[BallEvent], team: TeamSide) -> Scorecard {
    let mut projection = ScorecardProjection::new(roster.clone(), team);
    for ball in balls {
        projection.apply(ball);
    }
    projection.scorecard()
}

/// Build the scorecard through [`ProjectionRunner`], rejecting a ledger whose
/// sequence ids do not strictly increase.
pub fn rebuild(
    roster: &Roster,
    balls: &[BallEvent],
    team: TeamSide,
) -> Result<Scorecard, ProjectionError> {
    let (projection, _) = ProjectionRunner::rebuild_from_scratch(
        || ScorecardProjection::new(roster.clone(), team),
        balls,
    )?;
    Ok(projection.scorecard())
}

#[derive(Debug, Default, Clone, Copy)]
struct BatterTally {
    runs: u32,
    balls_faced: u32,
    fours: u32,
    sixes: u32,
    dismissed_by: Option<PlayerId>,
}

#[derive(Debug, Default, Clone, Copy)]
struct BowlerTally {
    balls: u32,
    runs: u32,
    wickets: u32,
}

/// Incremental scorecard, fed one ball at a time.
///
/// Drive it through `ProjectionRunner` to reject out-of-order balls. An undo
/// reuses the removed ball's sequence id, so after an undo the projection is
/// rebuilt from the ledger rather than patched.
#[derive(Debug, Clone)]
pub struct ScorecardProjection {
    roster: Roster,
    team: TeamSide,
    batters: HashMap<PlayerId, BatterTally>,
    bowlers: HashMap<PlayerId, BowlerTally>,
    extras: ExtrasBreakdown,
}

impl ScorecardProjection {
    pub fn new(roster: Roster, team: TeamSide) -> Self {
        Self {
            roster,
            team,
            batters: HashMap::new(),
            bowlers: HashMap::new(),
            extras: ExtrasBreakdown::default(),
        }
    }

    pub fn team(&self) -> TeamSide {
        self.team
    }

    /// Materialize the read model, lines in roster order.
    pub fn scorecard(&self) -> Scorecard {
        let players = self.roster.players(self.team);

        let batting = players
            .iter()
            .map(|p| {
                let t = self.batters.get(&p.id).copied().unwrap_or_default();
                BattingLine {
                    player_id: p.id,
                    name: p.name.clone(),
                    runs: t.runs,
                    balls_faced: t.balls_faced,
                    fours: t.fours,
                    sixes: t.sixes,
                    dismissed_by: t.dismissed_by,
                    strike_rate: rate(t.runs * 100, t.balls_faced),
                }
            })
            .collect();

        let per_over = u32::from(BALLS_PER_OVER);
        let bowling = players
            .iter()
            .map(|p| {
                let t = self.bowlers.get(&p.id).copied().unwrap_or_default();
                BowlingLine {
                    player_id: p.id,
                    name: p.name.clone(),
                    balls_bowled: t.balls,
                    overs: format!("{}.{}", t.balls / per_over, t.balls % per_over),
                    runs_conceded: t.runs,
                    wickets: t.wickets,
                    economy: rate(t.runs * per_over, t.balls),
                }
            })
            .collect();

        Scorecard {
            team: self.team,
            batting,
            bowling,
            extras: self.extras,
        }
    }
}

impl Projection for ScorecardProjection {
    type Ev = BallEvent;

    fn apply(&mut self, ball: &BallEvent) {
        if self.roster.is_member(self.team, ball.striker_id) {
            let batter = self.batters.entry(ball.striker_id).or_default();
            let scored = ball.batter_runs();
            batter.runs += scored;
            if ball.is_ball_faced() {
                batter.balls_faced += 1;
            }
            if ball.extra == ExtraType::None || ball.extra == ExtraType::NoBall {
                match scored {
                    4 => batter.fours += 1,
                    6 => batter.sixes += 1,
                    _ => {}
                }
            }
            if ball.is_wicket {
                batter.dismissed_by = Some(ball.bowler_id);
            }

            let extras = &mut self.extras;
            match ball.extra {
                ExtraType::None => {}
                ExtraType::Wide => extras.wides += ball.runs,
                ExtraType::NoBall => extras.no_balls += ball.runs,
                ExtraType::Bye => extras.byes += ball.runs,
                ExtraType::LegBye => extras.leg_byes += ball.runs,
            }
            if ball.extra.is_extra() {
                extras.total += ball.runs;
            }
        }

        if self.roster.is_member(self.team, ball.bowler_id) {
            let bowler = self.bowlers.entry(ball.bowler_id).or_default();
            bowler.runs += ball.runs;
            if ball.consumes_ball() {
                bowler.balls += 1;
            }
            if ball.is_wicket {
                bowler.wickets += 1;
            }
        }
    }
}

fn rate(numerator: u32, balls: u32) -> f64 {
    if balls == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(balls)
    }
}
