use std::path::PathBuf;

use crease_core::MatchId;
use crease_scoring::{
    BallInput, InningsNumber, Lineup, MatchConfig, MatchSetup, Roster, ScoringEngine, Team,
    TeamSide,
};

pub(crate) fn setup() -> MatchSetup {
    let roster = Roster::new(
        Team::named(TeamSide::A, "Alpha", &["A1", "A2", "A3"]),
        Team::named(TeamSide::B, "Bravo", &["B1", "B2"]),
    )
    .unwrap();
    MatchSetup::new(roster, MatchConfig::default().with_overs(2), TeamSide::A)
}

pub(crate) fn setup_of(engine: &ScoringEngine) -> MatchSetup {
    let batting_first = engine
        .innings(InningsNumber::First)
        .map(|i| i.batting_team)
        .unwrap();
    MatchSetup::new(engine.roster().clone(), engine.config().clone(), batting_first)
}

/// Engine with the opening lineup set.
pub(crate) fn started_engine(setup: MatchSetup) -> ScoringEngine {
    let a: Vec<_> = setup.roster.players(TeamSide::A).iter().map(|p| p.id).collect();
    let b: Vec<_> = setup.roster.players(TeamSide::B).iter().map(|p| p.id).collect();
    let mut engine = ScoringEngine::new(MatchId::new(), setup).unwrap();
    engine
        .start_innings(Lineup {
            striker: a[0],
            non_striker: Some(a[1]),
            bowler: b[0],
        })
        .unwrap();
    engine
}

/// Engine two balls into the first innings.
pub(crate) fn played_engine() -> ScoringEngine {
    let mut engine = started_engine(setup());
    engine.apply_ball(BallInput::score(4)).unwrap();
    engine.apply_ball(BallInput::score(1)).unwrap();
    engine
}

pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("crease-store-{}", MatchId::new()))
}
