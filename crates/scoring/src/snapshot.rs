//! Persisted form of a match.
//!
//! A snapshot is the full engine state plus the ledger it was derived from.
//! Restoring re-checks that the two agree before handing back an engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crease_core::{DomainError, DomainResult, MatchId, PlayerId};

use crate::ball::{BallEvent, InningsNumber};
use crate::config::MatchConfig;
use crate::engine::{MatchPhase, ScoringEngine};
use crate::innings::InningsState;
use crate::ledger::BallLedger;
use crate::result::MatchResult;
use crate::roster::{Availability, RoleAssignment, Roster};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub version: u64,
    pub config: MatchConfig,
    pub roster: Roster,
    pub ledger: Vec<BallEvent>,
    pub first: InningsState,
    pub second: Option<InningsState>,
    pub roles: RoleAssignment,
    pub out: Availability,
    pub phase: MatchPhase,
    pub result: Option<MatchResult>,
}

impl MatchSnapshot {
    /// Check the snapshot against its ledger without keeping the engine.
    pub fn verify(&self) -> DomainResult<()> {
        ScoringEngine::restore(self.clone()).map(|_| ())
    }
}

impl ScoringEngine {
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id,
            version: self.version,
            config: self.config.clone(),
            roster: self.roster.clone(),
            ledger: self.ledger.as_slice().to_vec(),
            first: self.first.clone(),
            second: self.second.clone(),
            roles: self.roles,
            out: self.out.clone(),
            phase: self.phase,
            result: self.result,
        }
    }

    /// Rebuild an engine from a snapshot, rejecting state that disagrees
    /// with its own ledger.
    pub fn restore(snapshot: MatchSnapshot) -> DomainResult<Self> {
        snapshot.config.validate()?;
        let ledger = BallLedger::from_events(snapshot.ledger)?;
        let engine = Self {
            id: snapshot.match_id,
            config: snapshot.config,
            roster: snapshot.roster,
            ledger,
            first: snapshot.first,
            second: snapshot.second,
            roles: snapshot.roles,
            out: snapshot.out,
            phase: snapshot.phase,
            result: snapshot.result,
            version: snapshot.version,
        };
        engine.check_consistency()?;
        Ok(engine)
    }

    fn check_consistency(&self) -> DomainResult<()> {
        if self.first.number != InningsNumber::First {
            return Err(invalid("first innings slot holds another innings"));
        }
        match (&self.second, self.phase) {
            (None, MatchPhase::FirstInnings) => {}
            (Some(second), MatchPhase::SecondInnings | MatchPhase::Completed) => {
                if second.number != InningsNumber::Second
                    || second.batting_team != self.first.bowling_team
                    || second.target != Some(self.first.runs + 1)
                {
                    return Err(invalid("second innings does not follow the first"));
                }
            }
            _ => return Err(invalid("phase does not match the innings played")),
        }
        if (self.phase == MatchPhase::Completed) != self.result.is_some() {
            return Err(invalid("result is only present once the match is complete"));
        }

        for innings in std::iter::once(&self.first).chain(self.second.as_ref()) {
            let balls = self.ledger.innings(innings.number);
            let runs: u32 = balls.iter().map(|b| b.runs).sum();
            let wickets = balls.iter().filter(|b| b.is_wicket).count() as u32;
            let legal = balls.iter().filter(|b| b.consumes_ball()).count() as u32;
            if runs != innings.runs || wickets != innings.wickets {
                return Err(invalid(format!(
                    "innings {} totals disagree with the ledger",
                    innings.number
                )));
            }
            if legal != innings.counter.legal_balls() {
                return Err(invalid(format!(
                    "innings {} over count disagrees with the ledger",
                    innings.number
                )));
            }
        }
        if self.second.is_none() && !self.ledger.innings(InningsNumber::Second).is_empty() {
            return Err(invalid("ledger holds second-innings balls before it opened"));
        }

        let current = self.current();
        let dismissed: BTreeSet<PlayerId> = self
            .ledger
            .innings(current.number)
            .iter()
            .filter(|b| b.is_wicket)
            .map(|b| b.striker_id)
            .collect();
        if !self.out.iter().copied().eq(dismissed.iter().copied()) {
            return Err(invalid("out set disagrees with recorded wickets"));
        }

        let batters_ok = [self.roles.striker, self.roles.non_striker]
            .into_iter()
            .flatten()
            .all(|id| self.roster.is_member(current.batting_team, id) && !self.out.is_out(id));
        let bowler_ok = self
            .roles
            .bowler
            .is_none_or(|id| self.roster.is_member(current.bowling_team, id));
        if !batters_ok || !bowler_ok {
            return Err(invalid("role assignment names ineligible players"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> DomainError {
    DomainError::validation(format!("snapshot rejected: {}", msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchSetup;
    use crate::ball::ExtraType;
    use crate::input::BallInput;
    use crate::roster::{Lineup, Team, TeamSide};

    fn played() -> ScoringEngine {
        let roster = Roster::new(
            Team::named(TeamSide::A, "Alpha", &["A1", "A2", "A3"]),
            Team::named(TeamSide::B, "Bravo", &["B1", "B2"]),
        )
        .unwrap();
        let a: Vec<_> = roster.players(TeamSide::A).iter().map(|p| p.id).collect();
        let b: Vec<_> = roster.players(TeamSide::B).iter().map(|p| p.id).collect();
        let setup = MatchSetup::new(roster, MatchConfig::default().with_overs(2), TeamSide::A);

        let mut engine = ScoringEngine::new(MatchId::new(), setup).unwrap();
        engine
            .start_innings(Lineup {
                striker: a[0],
                non_striker: Some(a[1]),
                bowler: b[0],
            })
            .unwrap();
        engine.apply_ball(BallInput::score(3)).unwrap();
        engine.apply_ball(BallInput::no_ball(0)).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        engine
    }

    #[test]
    fn snapshot_survives_json() {
        let engine = played();
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        let restored = ScoringEngine::restore(back).unwrap();
        assert_eq!(restored, engine);
    }

    #[test]
    fn tampered_totals_are_rejected() {
        let mut snapshot = played().snapshot();
        snapshot.first.runs += 1;
        let err = ScoringEngine::restore(snapshot).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn out_set_must_match_wickets() {
        let mut snapshot = played().snapshot();
        snapshot.out.clear();
        assert!(snapshot.verify().is_err());
    }

    #[test]
    fn missing_ball_is_rejected() {
        let mut snapshot = played().snapshot();
        snapshot.ledger.remove(1);
        assert!(ScoringEngine::restore(snapshot).is_err());
    }

    /// 2-a-side, 1 over, first batters and bowler in place.
    fn two_a_side() -> (ScoringEngine, Vec<PlayerId>, Vec<PlayerId>) {
        let roster = Roster::new(
            Team::named(TeamSide::A, "Alpha", &["A1", "A2"]),
            Team::named(TeamSide::B, "Bravo", &["B1", "B2"]),
        )
        .unwrap();
        let a: Vec<_> = roster.players(TeamSide::A).iter().map(|p| p.id).collect();
        let b: Vec<_> = roster.players(TeamSide::B).iter().map(|p| p.id).collect();
        let setup = MatchSetup::new(roster, MatchConfig::default().with_overs(1), TeamSide::A);
        let mut engine = ScoringEngine::new(MatchId::new(), setup).unwrap();
        engine
            .start_innings(Lineup {
                striker: a[0],
                non_striker: Some(a[1]),
                bowler: b[0],
            })
            .unwrap();
        (engine, a, b)
    }

    fn second_innings(engine: &mut ScoringEngine, a: &[PlayerId], b: &[PlayerId]) {
        engine.end_innings().unwrap();
        engine
            .start_innings(Lineup {
                striker: b[0],
                non_striker: Some(b[1]),
                bowler: a[0],
            })
            .unwrap();
    }

    fn assert_restores(engine: &ScoringEngine) {
        let snapshot = engine.snapshot();
        snapshot.verify().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(&ScoringEngine::restore(back).unwrap(), engine);
    }

    #[test]
    fn restores_after_first_innings_all_out() {
        let (mut engine, _, _) = two_a_side();
        engine.apply_ball(BallInput::score(4)).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        assert!(engine.current().is_complete());
        assert_eq!(engine.roles().striker, None);
        assert_restores(&engine);
    }

    #[test]
    fn restores_after_match_lost_all_out() {
        let (mut engine, a, b) = two_a_side();
        engine.apply_ball(BallInput::score(6)).unwrap();
        second_innings(&mut engine, &a, &b);
        engine.apply_ball(BallInput::score(1)).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        assert_eq!(engine.phase(), MatchPhase::Completed);
        assert_restores(&engine);
    }

    #[test]
    fn restores_after_target_reached_on_wicket_off_a_wide() {
        let (mut engine, a, b) = two_a_side();
        engine.apply_ball(BallInput::dot()).unwrap();
        second_innings(&mut engine, &a, &b);
        let stumped = BallInput::new(1, ExtraType::Wide, true);
        let outcome = engine.apply_ball(stumped).unwrap();
        assert!(matches!(
            outcome.decision,
            crate::outcome::Decision::MatchComplete { .. }
        ));
        assert_eq!(engine.roles().striker, None);
        assert_restores(&engine);
    }
}
