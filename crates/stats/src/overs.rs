use serde::{Deserialize, Serialize};

use crease_core::PlayerId;
use crease_scoring::{BallEvent, ExtraType, InningsNumber};

/// Totals for one over of an innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverSummary {
    /// 1-based over number.
    pub over: u32,
    pub bowler_id: PlayerId,
    pub runs: u32,
    /// Runs charged to the bowler: everything except byes and leg-byes.
    pub conceded: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    pub extras: u32,
}

impl OverSummary {
    pub fn is_maiden(&self) -> bool {
        self.legal_balls == u32::from(crease_scoring::BALLS_PER_OVER) && self.conceded == 0
    }
}

/// Per-over breakdown of one innings, in bowling order.
///
/// The last entry may be a partial over.
pub fn over_summaries(balls: &[BallEvent], innings: InningsNumber) -> Vec<OverSummary> {
    let mut overs: Vec<OverSummary> = Vec::new();
    for ball in balls.iter().filter(|b| b.innings == innings) {
        if overs.last().is_none_or(|last| last.over != ball.over) {
            overs.push(OverSummary {
                over: ball.over,
                bowler_id: ball.bowler_id,
                runs: 0,
                conceded: 0,
                wickets: 0,
                legal_balls: 0,
                extras: 0,
            });
        }
        let Some(summary) = overs.last_mut() else {
            continue;
        };

        summary.runs += ball.runs;
        if !matches!(ball.extra, ExtraType::Bye | ExtraType::LegBye) {
            summary.conceded += ball.runs;
        }
        if ball.is_wicket {
            summary.wickets += 1;
        }
        if ball.consumes_ball() {
            summary.legal_balls += 1;
        }
        if ball.extra.is_extra() {
            summary.extras += ball.runs;
        }
    }
    overs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ball(seq: u64, innings: InningsNumber, over: u32, runs: u32, extra: ExtraType) -> BallEvent {
        BallEvent {
            sequence_id: seq,
            innings,
            over,
            ball_in_over: 1,
            runs,
            extra,
            is_wicket: false,
            striker_id: PlayerId::new(),
            non_striker_id: None,
            bowler_id: PlayerId::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn groups_balls_by_over_within_innings() {
        let mut balls: Vec<BallEvent> = (1..=6)
            .map(|i| ball(i, InningsNumber::First, 1, 0, ExtraType::None))
            .collect();
        balls.push(ball(7, InningsNumber::First, 2, 2, ExtraType::Wide));
        balls.push(ball(8, InningsNumber::First, 2, 4, ExtraType::None));
        balls.push(ball(9, InningsNumber::Second, 1, 1, ExtraType::None));

        let overs = over_summaries(&balls, InningsNumber::First);
        assert_eq!(overs.len(), 2);
        assert!(overs[0].is_maiden());
        assert_eq!((overs[1].runs, overs[1].legal_balls, overs[1].extras), (6, 1, 2));

        assert_eq!(over_summaries(&balls, InningsNumber::Second).len(), 1);
    }

    #[test]
    fn byes_do_not_spoil_a_maiden() {
        let mut balls: Vec<BallEvent> = (1..=4)
            .map(|i| ball(i, InningsNumber::First, 1, 0, ExtraType::None))
            .collect();
        balls.push(ball(5, InningsNumber::First, 1, 2, ExtraType::Bye));
        balls.push(ball(6, InningsNumber::First, 1, 1, ExtraType::LegBye));

        let over = &over_summaries(&balls, InningsNumber::First)[0];
        assert_eq!((over.runs, over.conceded, over.extras), (3, 0, 3));
        assert!(over.is_maiden());

        balls.push(ball(7, InningsNumber::First, 2, 1, ExtraType::Wide));
        for i in 8..=13 {
            balls.push(ball(i, InningsNumber::First, 2, 0, ExtraType::None));
        }
        let overs = over_summaries(&balls, InningsNumber::First);
        assert_eq!(overs[1].conceded, 1);
        assert!(!overs[1].is_maiden());
    }
}
