//! Scoring engine: the match aggregate.
//!
//! Decisions are made in [`Aggregate::handle`] (pure, returns events) and
//! state only evolves in [`Aggregate::apply`]. The public methods
//! (`apply_ball`, `undo_last_ball`, `end_innings`, role selection) run
//! handle-then-apply and translate the emitted events for the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crease_core::{Aggregate, AggregateRoot, DomainError, DomainResult, MatchId, PlayerId};

use crate::ball::{BallEvent, InningsNumber};
use crate::config::{MatchConfig, MatchSetup};
use crate::innings::{InningsCompletion, InningsState, ScoreSnapshot};
use crate::input::BallInput;
use crate::ledger::BallLedger;
use crate::outcome::{BallOutcome, Decision, InningsTransition};
use crate::result::{FinalScores, Margin, MatchResult};
use crate::roster::{Availability, Lineup, RoleAssignment, Roster, TeamSide};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    FirstInnings,
    SecondInnings,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCommand {
    StartInnings(Lineup),
    RecordBall {
        input: BallInput,
        occurred_at: DateTime<Utc>,
    },
    UndoLastBall,
    SelectBowler(PlayerId),
    SelectBatsman(PlayerId),
    EndInnings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    LineupSet {
        innings: InningsNumber,
        lineup: Lineup,
    },
    BallRecorded(BallEvent),
    StrikeRotated,
    BatterDismissed {
        player_id: PlayerId,
    },
    /// The surviving non-striker takes strike and bats alone.
    LastManIn {
        player_id: PlayerId,
    },
    /// Striker slot cleared; a new batter must be selected.
    BatterNeeded,
    /// Bowler slot cleared; a new bowler must be selected.
    OverCompleted {
        over: u32,
        bowler_id: PlayerId,
    },
    InningsCompleted {
        innings: InningsNumber,
        reason: InningsCompletion,
    },
    MatchCompleted {
        result: MatchResult,
    },
    BallUndone(BallEvent),
    BowlerSelected {
        player_id: PlayerId,
    },
    BatsmanSelected {
        player_id: PlayerId,
    },
    SecondInningsOpened {
        batting_team: TeamSide,
        target: u32,
    },
}

impl MatchEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            MatchEvent::LineupSet { .. } => "scoring.innings.lineup_set",
            MatchEvent::BallRecorded(_) => "scoring.ball.recorded",
            MatchEvent::StrikeRotated => "scoring.strike.rotated",
            MatchEvent::BatterDismissed { .. } => "scoring.batter.dismissed",
            MatchEvent::LastManIn { .. } => "scoring.batter.last_man_in",
            MatchEvent::BatterNeeded => "scoring.batter.needed",
            MatchEvent::OverCompleted { .. } => "scoring.over.completed",
            MatchEvent::InningsCompleted { .. } => "scoring.innings.completed",
            MatchEvent::MatchCompleted { .. } => "scoring.match.completed",
            MatchEvent::BallUndone(_) => "scoring.ball.undone",
            MatchEvent::BowlerSelected { .. } => "scoring.bowler.selected",
            MatchEvent::BatsmanSelected { .. } => "scoring.batter.selected",
            MatchEvent::SecondInningsOpened { .. } => "scoring.innings.opened",
        }
    }
}

/// Aggregate root: one match being scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringEngine {
    pub(crate) id: MatchId,
    pub(crate) config: MatchConfig,
    pub(crate) roster: Roster,
    pub(crate) ledger: BallLedger,
    pub(crate) first: InningsState,
    pub(crate) second: Option<InningsState>,
    pub(crate) roles: RoleAssignment,
    pub(crate) out: Availability,
    pub(crate) phase: MatchPhase,
    pub(crate) result: Option<MatchResult>,
    pub(crate) version: u64,
}

impl ScoringEngine {
    pub fn new(id: MatchId, setup: MatchSetup) -> DomainResult<Self> {
        setup.config.validate()?;
        Ok(Self {
            id,
            config: setup.config,
            roster: setup.roster,
            ledger: BallLedger::new(),
            first: InningsState::first(setup.batting_first),
            second: None,
            roles: RoleAssignment::default(),
            out: Availability::new(),
            phase: MatchPhase::FirstInnings,
            result: None,
            version: 0,
        })
    }

    /// Rebuild a match by replaying a ball ledger from scratch.
    ///
    /// Roles are taken from each recorded ball, so the ledger alone is
    /// enough. A first innings closed without any second-innings balls is
    /// not visible in the ledger and stays open.
    pub fn replay(id: MatchId, setup: MatchSetup, balls: &[BallEvent]) -> DomainResult<Self> {
        let mut engine = Self::new(id, setup)?;
        for ball in balls {
            if ball.innings == InningsNumber::Second && engine.current().number == InningsNumber::First {
                engine.end_innings()?;
            }

            let innings = engine.current();
            let batting = innings.batting_team;
            let bowling = innings.bowling_team;
            let members_ok = engine.roster.is_member(batting, ball.striker_id)
                && ball
                    .non_striker_id
                    .is_none_or(|id| engine.roster.is_member(batting, id))
                && engine.roster.is_member(bowling, ball.bowler_id);
            if !members_ok {
                return Err(DomainError::validation(format!(
                    "ball {} names players outside the batting/bowling teams",
                    ball.sequence_id
                )));
            }

            engine.apply(&MatchEvent::LineupSet {
                innings: ball.innings,
                lineup: Lineup {
                    striker: ball.striker_id,
                    non_striker: ball.non_striker_id,
                    bowler: ball.bowler_id,
                },
            });

            let input = BallInput::new(ball.runs as i32, ball.extra, ball.is_wicket);
            let outcome = engine.apply_ball_at(input, ball.recorded_at)?;
            if outcome.ball != *ball {
                return Err(DomainError::validation(format!(
                    "replayed ball {} diverged from the ledger",
                    ball.sequence_id
                )));
            }
        }
        Ok(engine)
    }

    pub fn match_id(&self) -> MatchId {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &BallLedger {
        &self.ledger
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    pub fn out_set(&self) -> &Availability {
        &self.out
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    /// The innings in progress (or the last one played).
    pub fn current(&self) -> &InningsState {
        self.second.as_ref().unwrap_or(&self.first)
    }

    pub fn innings(&self, number: InningsNumber) -> Option<&InningsState> {
        match number {
            InningsNumber::First => Some(&self.first),
            InningsNumber::Second => self.second.as_ref(),
        }
    }

    pub fn score(&self) -> ScoreSnapshot {
        self.current().snapshot(self.config.overs_per_innings)
    }

    pub fn final_scores(&self) -> Option<FinalScores> {
        let second = self.second.as_ref()?;
        Some(FinalScores {
            first: (&self.first).into(),
            second: second.into(),
            result: self.result?,
        })
    }

    /// Batters the caller may send in after a wicket.
    pub fn eligible_batters(&self) -> Vec<PlayerId> {
        self.out
            .available_batters(&self.roster, self.current().batting_team)
            .into_iter()
            .filter(|id| Some(*id) != self.roles.striker && Some(*id) != self.roles.non_striker)
            .collect()
    }

    /// Bowler of the last completed over in the current innings.
    pub fn previous_over_bowler(&self) -> Option<PlayerId> {
        let innings = self.current();
        let completed = innings.counter.completed_overs();
        if completed == 0 {
            return None;
        }
        self.ledger
            .innings(innings.number)
            .iter()
            .rev()
            .find(|b| b.over == completed)
            .map(|b| b.bowler_id)
    }

    // -------------------------
    // Operations
    // -------------------------

    pub fn start_innings(&mut self, lineup: Lineup) -> DomainResult<()> {
        self.execute(MatchCommand::StartInnings(lineup)).map(|_| ())
    }

    pub fn select_bowler(&mut self, player_id: PlayerId) -> DomainResult<()> {
        self.execute(MatchCommand::SelectBowler(player_id)).map(|_| ())
    }

    pub fn select_batsman(&mut self, player_id: PlayerId) -> DomainResult<()> {
        self.execute(MatchCommand::SelectBatsman(player_id)).map(|_| ())
    }

    pub fn apply_ball(&mut self, input: BallInput) -> DomainResult<BallOutcome> {
        self.apply_ball_at(input, Utc::now())
    }

    pub fn apply_ball_at(
        &mut self,
        input: BallInput,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<BallOutcome> {
        let events = self.execute(MatchCommand::RecordBall { input, occurred_at })?;

        let ball = events
            .iter()
            .find_map(|e| match e {
                MatchEvent::BallRecorded(b) => Some(b.clone()),
                _ => None,
            })
            .ok_or_else(|| DomainError::illegal_state("delivery was not recorded"))?;
        let decision = decide(&events);
        let score = self.score();

        debug!(
            match_id = %self.id,
            sequence_id = ball.sequence_id,
            runs = ball.runs,
            extra = ?ball.extra,
            wicket = ball.is_wicket,
            score = %format_args!("{}/{} ({})", score.runs, score.wickets, score.overs),
            "ball recorded"
        );
        match &decision {
            Decision::Continue => {}
            Decision::BowlerNeeded => info!(match_id = %self.id, over = ball.over, "over complete"),
            Decision::BatsmanNeeded { .. } | Decision::LastManBatting { .. } => {
                info!(match_id = %self.id, wickets = score.wickets, decision = ?decision, "wicket")
            }
            Decision::InningsComplete { reason } => {
                info!(match_id = %self.id, innings = %score.innings, reason = ?reason, "innings complete")
            }
            Decision::MatchComplete { result } => {
                info!(match_id = %self.id, result = ?result, "match complete")
            }
        }

        Ok(BallOutcome {
            ball,
            score,
            decision,
        })
    }

    /// Remove the most recent ball of the current innings.
    ///
    /// Returns `Ok(None)` when the innings has no balls yet.
    pub fn undo_last_ball(&mut self) -> DomainResult<Option<BallEvent>> {
        let events = self.execute(MatchCommand::UndoLastBall)?;
        let undone = events.into_iter().find_map(|e| match e {
            MatchEvent::BallUndone(b) => Some(b),
            _ => None,
        });
        if let Some(ball) = &undone {
            info!(match_id = %self.id, sequence_id = ball.sequence_id, "ball undone");
        }
        Ok(undone)
    }

    pub fn end_innings(&mut self) -> DomainResult<InningsTransition> {
        self.execute(MatchCommand::EndInnings)?;

        if self.phase == MatchPhase::Completed {
            let scores = self
                .final_scores()
                .ok_or_else(|| DomainError::illegal_state("match completed without a result"))?;
            info!(match_id = %self.id, result = ?scores.result, "match closed");
            return Ok(InningsTransition::MatchComplete { scores });
        }

        let target = self.current().target.unwrap_or(self.first.runs + 1);
        info!(match_id = %self.id, target, "first innings closed");
        Ok(InningsTransition::SecondInningsReady {
            target,
            first_innings: (&self.first).into(),
        })
    }

    fn execute(&mut self, command: MatchCommand) -> DomainResult<Vec<MatchEvent>> {
        let events = self
            .handle(&command)
            .inspect_err(|e| debug!(match_id = %self.id, error = %e, "command rejected"))?;
        for e in &events {
            self.apply(e);
        }
        Ok(events)
    }

    fn current_mut(&mut self) -> &mut InningsState {
        match self.second.as_mut() {
            Some(second) => second,
            None => &mut self.first,
        }
    }

    fn wickets_in_hand(&self, side: TeamSide, wickets: u32) -> u32 {
        self.config
            .max_wickets(self.roster.players(side).len())
            .saturating_sub(wickets)
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.roster
            .player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

impl AggregateRoot for ScoringEngine {
    type Id = MatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for ScoringEngine {
    type Command = MatchCommand;
    type Event = MatchEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            MatchEvent::LineupSet { lineup, .. } => {
                self.roles = RoleAssignment {
                    striker: Some(lineup.striker),
                    non_striker: lineup.non_striker,
                    bowler: Some(lineup.bowler),
                };
            }
            MatchEvent::BallRecorded(ball) => {
                self.ledger.append(ball.clone());
                let innings = self.current_mut();
                innings.runs += ball.runs;
                if ball.is_wicket {
                    innings.wickets += 1;
                }
                if ball.consumes_ball() {
                    innings.counter.advance();
                }
            }
            MatchEvent::StrikeRotated => self.roles.swap_strike(),
            MatchEvent::BatterDismissed { player_id } => {
                self.out.mark_out(*player_id);
                // A dismissed batter never keeps a slot, even when the innings ends on the ball.
                if self.roles.striker == Some(*player_id) {
                    self.roles.striker = None;
                }
            }
            MatchEvent::LastManIn { player_id } => {
                self.roles.striker = Some(*player_id);
                self.roles.non_striker = None;
            }
            MatchEvent::BatterNeeded => self.roles.striker = None,
            MatchEvent::OverCompleted { .. } => self.roles.bowler = None,
            MatchEvent::InningsCompleted { innings, reason } => {
                if let Some(state) = match innings {
                    InningsNumber::First => Some(&mut self.first),
                    InningsNumber::Second => self.second.as_mut(),
                } {
                    state.completion = Some(*reason);
                }
            }
            MatchEvent::MatchCompleted { result } => {
                self.result = Some(*result);
                self.phase = MatchPhase::Completed;
            }
            MatchEvent::BallUndone(ball) => {
                self.ledger.pop_last(ball.innings);
                let innings = self.current_mut();
                innings.runs = innings.runs.saturating_sub(ball.runs);
                if ball.is_wicket {
                    innings.wickets = innings.wickets.saturating_sub(1);
                }
                if ball.consumes_ball() {
                    innings.counter.retreat();
                }
                if innings.completion.is_some_and(InningsCompletion::is_from_play) {
                    innings.completion = None;
                }

                if ball.is_wicket {
                    self.out.unmark_out(ball.striker_id);
                }
                // Roles were captured on the ball, so the pre-delivery state is exact.
                self.roles = RoleAssignment {
                    striker: Some(ball.striker_id),
                    non_striker: ball.non_striker_id,
                    bowler: Some(ball.bowler_id),
                };
                if self.phase == MatchPhase::Completed {
                    self.phase = MatchPhase::SecondInnings;
                    self.result = None;
                }
            }
            MatchEvent::BowlerSelected { player_id } => self.roles.bowler = Some(*player_id),
            MatchEvent::BatsmanSelected { player_id } => self.roles.striker = Some(*player_id),
            MatchEvent::SecondInningsOpened {
                batting_team,
                target,
            } => {
                self.second = Some(InningsState::second(*batting_team, *target));
                self.roles = RoleAssignment::default();
                self.out.clear();
                self.phase = MatchPhase::SecondInnings;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            MatchCommand::StartInnings(lineup) => self.handle_start_innings(lineup),
            MatchCommand::RecordBall { input, occurred_at } => {
                self.handle_record_ball(input, *occurred_at)
            }
            MatchCommand::UndoLastBall => self.handle_undo(),
            MatchCommand::SelectBowler(id) => self.handle_select_bowler(*id),
            MatchCommand::SelectBatsman(id) => self.handle_select_batsman(*id),
            MatchCommand::EndInnings => self.handle_end_innings(),
        }
    }
}

impl ScoringEngine {
    fn ensure_in_play(&self) -> DomainResult<&InningsState> {
        if self.phase == MatchPhase::Completed {
            return Err(DomainError::illegal_state("match is already complete"));
        }
        let innings = self.current();
        if innings.is_complete() {
            return Err(DomainError::illegal_state(format!(
                "innings {} is complete; end the innings to continue",
                innings.number
            )));
        }
        Ok(innings)
    }

    fn ensure_can_bat(&self, side: TeamSide, id: PlayerId, slot: &str) -> DomainResult<()> {
        if !self.roster.is_member(side, id) {
            return Err(DomainError::validation(format!(
                "{slot} must belong to the batting team"
            )));
        }
        if self.out.is_out(id) {
            return Err(DomainError::validation(format!(
                "{} is already out",
                self.player_name(id)
            )));
        }
        Ok(())
    }

    fn handle_start_innings(&self, lineup: &Lineup) -> DomainResult<Vec<MatchEvent>> {
        let innings = self.ensure_in_play()?;
        if !self.ledger.innings(innings.number).is_empty() {
            return Err(DomainError::illegal_state(format!(
                "innings {} is already under way",
                innings.number
            )));
        }

        let batting = innings.batting_team;
        self.ensure_can_bat(batting, lineup.striker, "striker")?;
        match lineup.non_striker {
            Some(ns) => {
                self.ensure_can_bat(batting, ns, "non-striker")?;
                if ns == lineup.striker {
                    return Err(DomainError::validation(
                        "striker and non-striker must be different players",
                    ));
                }
            }
            None => {
                let others = self
                    .out
                    .available_batters(&self.roster, batting)
                    .into_iter()
                    .filter(|id| *id != lineup.striker)
                    .count();
                if others > 0 {
                    return Err(DomainError::validation(
                        "a non-striker is required while other batters are available",
                    ));
                }
            }
        }
        if !self.roster.is_member(innings.bowling_team, lineup.bowler) {
            return Err(DomainError::validation("bowler must belong to the bowling team"));
        }

        Ok(vec![MatchEvent::LineupSet {
            innings: innings.number,
            lineup: *lineup,
        }])
    }

    fn handle_select_bowler(&self, player_id: PlayerId) -> DomainResult<Vec<MatchEvent>> {
        let innings = self.ensure_in_play()?;
        if !self.roster.is_member(innings.bowling_team, player_id) {
            return Err(DomainError::validation("bowler must belong to the bowling team"));
        }
        if self.config.forbid_consecutive_overs
            && innings.counter.balls_in_over() == 0
            && self.previous_over_bowler() == Some(player_id)
        {
            return Err(DomainError::validation(format!(
                "{} bowled the previous over",
                self.player_name(player_id)
            )));
        }
        Ok(vec![MatchEvent::BowlerSelected { player_id }])
    }

    fn handle_select_batsman(&self, player_id: PlayerId) -> DomainResult<Vec<MatchEvent>> {
        let innings = self.ensure_in_play()?;
        if self.roles.striker.is_some() {
            return Err(DomainError::illegal_state("striker slot is already filled"));
        }
        self.ensure_can_bat(innings.batting_team, player_id, "batter")?;
        if self.roles.non_striker == Some(player_id) {
            return Err(DomainError::validation(
                "the non-striker is already batting",
            ));
        }
        Ok(vec![MatchEvent::BatsmanSelected { player_id }])
    }

    fn handle_record_ball(
        &self,
        input: &BallInput,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Vec<MatchEvent>> {
        let innings = self.ensure_in_play()?;
        let runs = input.validate()?;
        let striker = self
            .roles
            .striker
            .ok_or_else(|| DomainError::illegal_state("no striker assigned"))?;
        let bowler = self
            .roles
            .bowler
            .ok_or_else(|| DomainError::illegal_state("no bowler assigned"))?;

        let ball = BallEvent {
            sequence_id: self.ledger.next_sequence_id(),
            innings: innings.number,
            over: innings.counter.current_over(),
            ball_in_over: innings.counter.next_ball(),
            runs,
            extra: input.extra,
            is_wicket: input.is_wicket,
            striker_id: striker,
            non_striker_id: self.roles.non_striker,
            bowler_id: bowler,
            recorded_at: occurred_at,
        };

        let mut counter = innings.counter;
        let over_done = ball.consumes_ball() && counter.advance();
        let total_runs = innings.runs + runs;
        let total_wickets = innings.wickets + u32::from(ball.is_wicket);

        let mut events = vec![MatchEvent::BallRecorded(ball.clone())];
        if ball.is_wicket {
            events.push(MatchEvent::BatterDismissed { player_id: striker });
        }

        // A successful chase ends the match before anything else this ball triggered.
        if let Some(target) = innings.target {
            if total_runs >= target {
                events.push(MatchEvent::InningsCompleted {
                    innings: innings.number,
                    reason: InningsCompletion::TargetReached,
                });
                events.push(MatchEvent::MatchCompleted {
                    result: MatchResult::Won {
                        winner: innings.batting_team,
                        margin: Margin::Wickets(
                            self.wickets_in_hand(innings.batting_team, total_wickets),
                        ),
                    },
                });
                return Ok(events);
            }
        }

        let mut completion = None;
        let mut follow_up = None;
        if ball.is_wicket {
            let mut out = self.out.clone();
            out.mark_out(striker);
            let available = out.available_batters(&self.roster, innings.batting_team);
            if available.len() <= 1 {
                match (available.first(), self.roles.non_striker) {
                    (Some(&lone), Some(non_striker))
                        if lone == non_striker && self.config.last_man_stands =>
                    {
                        follow_up = Some(MatchEvent::LastManIn { player_id: lone });
                    }
                    _ => completion = Some(InningsCompletion::AllOut),
                }
            } else {
                follow_up = Some(MatchEvent::BatterNeeded);
            }
        } else if ball.runs_run() % 2 == 1 && self.roles.non_striker.is_some() {
            follow_up = Some(MatchEvent::StrikeRotated);
        }

        if completion.is_none() && counter.completed_overs() >= self.config.overs_per_innings {
            completion = Some(InningsCompletion::OversExhausted);
        }

        match completion {
            Some(reason) => {
                events.push(MatchEvent::InningsCompleted {
                    innings: innings.number,
                    reason,
                });
                if innings.number == InningsNumber::Second {
                    let mut second = innings.clone();
                    second.runs = total_runs;
                    second.wickets = total_wickets;
                    let in_hand = self.wickets_in_hand(second.batting_team, total_wickets);
                    events.push(MatchEvent::MatchCompleted {
                        result: MatchResult::decide(&self.first, &second, in_hand),
                    });
                }
            }
            None => {
                events.extend(follow_up);
                if over_done {
                    events.push(MatchEvent::OverCompleted {
                        over: ball.over,
                        bowler_id: bowler,
                    });
                }
            }
        }

        Ok(events)
    }

    fn handle_undo(&self) -> DomainResult<Vec<MatchEvent>> {
        let innings = self.current();
        if self.phase == MatchPhase::Completed
            && innings.completion == Some(InningsCompletion::Closed)
        {
            return Err(DomainError::illegal_state("match has been closed"));
        }
        Ok(self
            .ledger
            .last_in(innings.number)
            .map(|b| vec![MatchEvent::BallUndone(b.clone())])
            .unwrap_or_default())
    }

    fn handle_end_innings(&self) -> DomainResult<Vec<MatchEvent>> {
        if self.phase == MatchPhase::Completed {
            return Err(DomainError::illegal_state("match is already complete"));
        }

        let innings = self.current();
        let mut events = Vec::new();
        if !innings.is_complete() {
            events.push(MatchEvent::InningsCompleted {
                innings: innings.number,
                reason: InningsCompletion::Closed,
            });
        }

        match innings.number {
            InningsNumber::First => events.push(MatchEvent::SecondInningsOpened {
                batting_team: innings.bowling_team,
                target: innings.runs + 1,
            }),
            InningsNumber::Second => {
                let in_hand = self.wickets_in_hand(innings.batting_team, innings.wickets);
                events.push(MatchEvent::MatchCompleted {
                    result: MatchResult::decide(&self.first, innings, in_hand),
                });
            }
        }
        Ok(events)
    }
}

/// Map the events of one delivery to the single decision handed to the caller.
fn decide(events: &[MatchEvent]) -> Decision {
    let mut bowler_needed = false;
    let mut batsman_needed = false;
    let mut last_man = None;
    let mut completion = None;

    for e in events {
        match e {
            MatchEvent::MatchCompleted { result } => {
                return Decision::MatchComplete { result: *result };
            }
            MatchEvent::InningsCompleted { reason, .. } => completion = Some(*reason),
            MatchEvent::OverCompleted { .. } => bowler_needed = true,
            MatchEvent::BatterNeeded => batsman_needed = true,
            MatchEvent::LastManIn { player_id } => last_man = Some(*player_id),
            _ => {}
        }
    }

    if let Some(reason) = completion {
        Decision::InningsComplete { reason }
    } else if let Some(player_id) = last_man {
        Decision::LastManBatting {
            player_id,
            bowler_needed,
        }
    } else if batsman_needed {
        Decision::BatsmanNeeded { bowler_needed }
    } else if bowler_needed {
        Decision::BowlerNeeded
    } else {
        Decision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Team;
    use crease_core::DomainError;
    use proptest::prelude::*;

    fn setup(a: &[&str], b: &[&str], config: MatchConfig) -> MatchSetup {
        let roster = Roster::new(
            Team::named(TeamSide::A, "Alpha", a),
            Team::named(TeamSide::B, "Bravo", b),
        )
        .unwrap();
        MatchSetup::new(roster, config, TeamSide::A)
    }

    fn ids(engine: &ScoringEngine, side: TeamSide) -> Vec<PlayerId> {
        engine.roster().players(side).iter().map(|p| p.id).collect()
    }

    /// Match with the first two batters and first bowler in place.
    fn started(a: &[&str], b: &[&str], config: MatchConfig) -> ScoringEngine {
        let mut engine = ScoringEngine::new(MatchId::new(), setup(a, b, config)).unwrap();
        open_innings(&mut engine);
        engine
    }

    fn open_innings(engine: &mut ScoringEngine) {
        let batting = ids(engine, engine.current().batting_team);
        let bowling = ids(engine, engine.current().bowling_team);
        engine
            .start_innings(Lineup {
                striker: batting[0],
                non_striker: batting.get(1).copied(),
                bowler: bowling[0],
            })
            .unwrap();
    }

    fn two_a_side(overs: u32) -> ScoringEngine {
        started(
            &["Asha", "Ben"],
            &["Cleo", "Dev"],
            MatchConfig::default().with_overs(overs),
        )
    }

    #[test]
    fn short_match_plays_out_to_a_result() {
        let mut engine = two_a_side(1);
        let a = ids(&engine, TeamSide::A);
        let b = ids(&engine, TeamSide::B);

        let four = engine.apply_ball(BallInput::score(4)).unwrap();
        assert_eq!(four.decision, Decision::Continue);
        assert_eq!((four.score.runs, four.score.overs.as_str()), (4, "0.1"));

        let wicket = engine.apply_ball(BallInput::wicket()).unwrap();
        assert_eq!(
            wicket.decision,
            Decision::LastManBatting {
                player_id: a[1],
                bowler_needed: false
            }
        );
        assert_eq!(engine.roles().striker, Some(a[1]));
        assert_eq!(engine.roles().non_striker, None);

        let last = engine.apply_ball(BallInput::wicket()).unwrap();
        assert_eq!(
            last.decision,
            Decision::InningsComplete {
                reason: InningsCompletion::AllOut
            }
        );
        assert_eq!((last.score.runs, last.score.wickets), (4, 2));
        assert_eq!(engine.roles().striker, None);

        let transition = engine.end_innings().unwrap();
        assert!(matches!(
            transition,
            InningsTransition::SecondInningsReady { target: 5, .. }
        ));
        assert_eq!(engine.current().batting_team, TeamSide::B);
        assert_eq!(*engine.roles(), RoleAssignment::default());
        assert!(engine.out_set().is_empty());

        engine
            .start_innings(Lineup {
                striker: b[0],
                non_striker: Some(b[1]),
                bowler: a[0],
            })
            .unwrap();
        engine.apply_ball(BallInput::score(2)).unwrap();
        let chase = engine.apply_ball(BallInput::score(3)).unwrap();

        assert_eq!(
            chase.decision,
            Decision::MatchComplete {
                result: MatchResult::Won {
                    winner: TeamSide::B,
                    margin: Margin::Wickets(2)
                }
            }
        );
        assert_eq!(engine.phase(), MatchPhase::Completed);
        assert_eq!(
            engine.current().completion,
            Some(InningsCompletion::TargetReached)
        );
        let scores = engine.final_scores().unwrap();
        assert_eq!(scores.first.runs, 4);
        assert_eq!(scores.second.runs, 5);

        let err = engine.apply_ball(BallInput::dot()).unwrap_err();
        assert!(matches!(err, DomainError::IllegalState(_)));
    }

    #[test]
    fn sixth_legal_ball_asks_for_a_new_bowler() {
        let mut engine = two_a_side(5);
        let b = ids(&engine, TeamSide::B);

        for _ in 0..5 {
            assert_eq!(
                engine.apply_ball(BallInput::dot()).unwrap().decision,
                Decision::Continue
            );
        }
        let sixth = engine.apply_ball(BallInput::dot()).unwrap();
        assert_eq!(sixth.decision, Decision::BowlerNeeded);
        assert_eq!(sixth.score.overs, "1.0");
        assert_eq!(sixth.ball.over, 1);
        assert_eq!(sixth.ball.ball_in_over, 6);
        assert_eq!(engine.roles().bowler, None);

        let before = engine.clone();
        let err = engine.apply_ball(BallInput::dot()).unwrap_err();
        assert!(matches!(err, DomainError::IllegalState(_)));
        assert_eq!(engine, before);

        engine.select_bowler(b[1]).unwrap();
        let next = engine.apply_ball(BallInput::dot()).unwrap();
        assert_eq!((next.ball.over, next.ball.ball_in_over), (2, 1));
        assert_eq!(next.ball.bowler_id, b[1]);
    }

    #[test]
    fn wides_and_no_balls_do_not_use_up_the_over() {
        let mut engine = two_a_side(5);

        let wide = engine.apply_ball(BallInput::wide()).unwrap();
        assert_eq!(wide.score.runs, 1);
        assert_eq!(wide.score.overs, "0.0");
        assert_eq!(wide.ball.ball_in_over, 1);

        let no_ball = engine.apply_ball(BallInput::no_ball(4)).unwrap();
        assert_eq!(no_ball.ball.runs, 5);
        assert_eq!(no_ball.score.overs, "0.0");

        let legal = engine.apply_ball(BallInput::dot()).unwrap();
        assert_eq!(legal.ball.ball_in_over, 1);
        assert_eq!(legal.score.overs, "0.1");
        assert_eq!(legal.score.runs, 6);
    }

    #[test]
    fn strike_rotates_on_odd_runs_actually_run() {
        let mut engine = two_a_side(5);
        let a = ids(&engine, TeamSide::A);

        engine.apply_ball(BallInput::score(1)).unwrap();
        assert_eq!(engine.roles().striker, Some(a[1]));

        // Wide penalty alone: nobody ran.
        engine.apply_ball(BallInput::wide()).unwrap();
        assert_eq!(engine.roles().striker, Some(a[1]));

        // No-ball with one run run: rotates.
        engine.apply_ball(BallInput::no_ball(1)).unwrap();
        assert_eq!(engine.roles().striker, Some(a[0]));

        engine.apply_ball(BallInput::leg_bye(3)).unwrap();
        assert_eq!(engine.roles().striker, Some(a[1]));

        engine.apply_ball(BallInput::score(2)).unwrap();
        assert_eq!(engine.roles().striker, Some(a[1]));
    }

    #[test]
    fn wicket_on_last_ball_of_over_needs_batter_then_bowler() {
        let mut engine = started(
            &["A1", "A2", "A3", "A4"],
            &["B1", "B2"],
            MatchConfig::default().with_overs(4),
        );
        let a = ids(&engine, TeamSide::A);
        let b = ids(&engine, TeamSide::B);

        for _ in 0..5 {
            engine.apply_ball(BallInput::dot()).unwrap();
        }
        let out = engine.apply_ball(BallInput::wicket()).unwrap();
        assert_eq!(
            out.decision,
            Decision::BatsmanNeeded {
                bowler_needed: true
            }
        );
        assert!(out.decision.needs_bowler());
        assert!(engine.out_set().is_out(a[0]));
        assert_eq!(engine.eligible_batters(), vec![a[2], a[3]]);

        let err = engine.select_batsman(a[0]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = engine.select_batsman(a[1]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        engine.select_batsman(a[2]).unwrap();
        engine.select_bowler(b[1]).unwrap();
        let next = engine.apply_ball(BallInput::dot()).unwrap();
        assert_eq!(next.ball.striker_id, a[2]);
    }

    #[test]
    fn last_man_stands_off_ends_innings_with_one_left() {
        let mut engine = started(
            &["A1", "A2", "A3"],
            &["B1", "B2"],
            MatchConfig::default().with_last_man_stands(false),
        );
        let a = ids(&engine, TeamSide::A);

        engine.apply_ball(BallInput::wicket()).unwrap();
        engine.select_batsman(a[2]).unwrap();
        let second = engine.apply_ball(BallInput::wicket()).unwrap();
        assert_eq!(
            second.decision,
            Decision::InningsComplete {
                reason: InningsCompletion::AllOut
            }
        );
        assert_eq!(second.score.wickets, 2);
    }

    #[test]
    fn overs_exhausted_in_first_innings_skips_bowler_request() {
        let mut engine = two_a_side(1);
        for _ in 0..5 {
            engine.apply_ball(BallInput::score(1)).unwrap();
        }
        let last = engine.apply_ball(BallInput::score(1)).unwrap();
        assert_eq!(
            last.decision,
            Decision::InningsComplete {
                reason: InningsCompletion::OversExhausted
            }
        );
        assert_eq!(last.score.balls_remaining, 0);

        let err = engine.apply_ball(BallInput::dot()).unwrap_err();
        assert!(matches!(err, DomainError::IllegalState(_)));
    }

    #[test]
    fn defended_total_wins_by_runs() {
        let mut engine = two_a_side(1);
        engine.apply_ball(BallInput::score(6)).unwrap();
        engine.end_innings().unwrap();
        open_innings(&mut engine);

        engine.apply_ball(BallInput::score(2)).unwrap();
        engine.apply_ball(BallInput::wicket()).unwrap();
        let out = engine.apply_ball(BallInput::wicket()).unwrap();

        assert_eq!(
            out.decision,
            Decision::MatchComplete {
                result: MatchResult::Won {
                    winner: TeamSide::A,
                    margin: Margin::Runs(4)
                }
            }
        );
    }

    #[test]
    fn chase_ending_on_over_completion_reports_match_complete() {
        let mut engine = two_a_side(1);
        engine.apply_ball(BallInput::score(3)).unwrap();
        engine.end_innings().unwrap();
        open_innings(&mut engine);

        for _ in 0..5 {
            engine.apply_ball(BallInput::dot()).unwrap();
        }
        let last = engine.apply_ball(BallInput::score(4)).unwrap();
        assert!(matches!(last.decision, Decision::MatchComplete { .. }));
        assert_eq!(
            engine.current().completion,
            Some(InningsCompletion::TargetReached)
        );
    }

    #[test]
    fn closing_the_second_innings_decides_the_match() {
        let mut engine = two_a_side(5);
        engine.apply_ball(BallInput::score(2)).unwrap();
        engine.end_innings().unwrap();
        open_innings(&mut engine);
        engine.apply_ball(BallInput::score(2)).unwrap();

        let transition = engine.end_innings().unwrap();
        let InningsTransition::MatchComplete { scores } = transition else {
            panic!("expected match completion");
        };
        assert_eq!(scores.result, MatchResult::Tie);

        assert!(engine.end_innings().is_err());
        let err = engine.undo_last_ball().unwrap_err();
        assert!(matches!(err, DomainError::IllegalState(_)));
    }

    #[test]
    fn undo_restores_roles_and_totals() {
        let mut engine = started(
            &["A1", "A2", "A3"],
            &["B1", "B2"],
            MatchConfig::default().with_overs(3),
        );
        assert_eq!(engine.undo_last_ball().unwrap(), None);

        engine.apply_ball(BallInput::score(1)).unwrap();
        let before = engine.clone();

        let out = engine.apply_ball(BallInput::wicket()).unwrap();
        assert!(matches!(out.decision, Decision::BatsmanNeeded { .. }));

        let undone = engine.undo_last_ball().unwrap().unwrap();
        assert_eq!(undone.sequence_id, 2);
        assert_eq!(engine.current(), before.current());
        assert_eq!(engine.roles(), before.roles());
        assert_eq!(engine.out_set(), before.out_set());
        assert_eq!(engine.ledger(), before.ledger());
        assert!(engine.version() > before.version());

        let again = engine.apply_ball(BallInput::dot()).unwrap();
        assert_eq!(again.ball.sequence_id, 2);
    }

    #[test]
    fn undo_reopens_a_completed_match() {
        let mut engine = two_a_side(1);
        engine.apply_ball(BallInput::score(1)).unwrap();
        engine.end_innings().unwrap();
        open_innings(&mut engine);
        engine.apply_ball(BallInput::score(2)).unwrap();
        assert_eq!(engine.phase(), MatchPhase::Completed);

        engine.undo_last_ball().unwrap().unwrap();
        assert_eq!(engine.phase(), MatchPhase::SecondInnings);
        assert_eq!(engine.result(), None);
        assert_eq!(engine.current().completion, None);

        // Nothing left in the second innings; the first is out of reach.
        assert_eq!(engine.undo_last_ball().unwrap(), None);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn same_bowler_cannot_take_consecutive_overs_when_forbidden() {
        let mut engine = started(
            &["A1", "A2"],
            &["B1", "B2"],
            MatchConfig::default().with_forbid_consecutive_overs(true),
        );
        let b = ids(&engine, TeamSide::B);
        for _ in 0..6 {
            engine.apply_ball(BallInput::dot()).unwrap();
        }
        assert_eq!(engine.previous_over_bowler(), Some(b[0]));

        let err = engine.select_bowler(b[0]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        engine.select_bowler(b[1]).unwrap();
    }

    #[test]
    fn start_innings_validates_lineup() {
        let mut engine =
            ScoringEngine::new(MatchId::new(), setup(&["A1", "A2"], &["B1"], MatchConfig::default()))
                .unwrap();
        let a = ids(&engine, TeamSide::A);
        let b = ids(&engine, TeamSide::B);

        let same = Lineup {
            striker: a[0],
            non_striker: Some(a[0]),
            bowler: b[0],
        };
        assert!(engine.start_innings(same).is_err());

        let wrong_team = Lineup {
            striker: b[0],
            non_striker: Some(a[1]),
            bowler: a[0],
        };
        assert!(engine.start_innings(wrong_team).is_err());

        let missing_partner = Lineup {
            striker: a[0],
            non_striker: None,
            bowler: b[0],
        };
        assert!(engine.start_innings(missing_partner).is_err());
        assert_eq!(engine.version(), 0);

        let err = engine.apply_ball(BallInput::dot()).unwrap_err();
        assert!(matches!(err, DomainError::IllegalState(_)));
    }

    #[test]
    fn replay_rebuilds_the_same_state() {
        let mut engine = two_a_side(2);
        engine.apply_ball(BallInput::score(1)).unwrap();
        engine.apply_ball(BallInput::wide()).unwrap();
        engine.apply_ball(BallInput::score(4)).unwrap();
        engine.end_innings().unwrap();
        open_innings(&mut engine);
        engine.apply_ball(BallInput::bye(2)).unwrap();

        let setup = MatchSetup::new(
            engine.roster().clone(),
            engine.config().clone(),
            TeamSide::A,
        );
        let rebuilt =
            ScoringEngine::replay(engine.match_id(), setup, engine.ledger().as_slice()).unwrap();

        assert_eq!(rebuilt.ledger(), engine.ledger());
        assert_eq!(rebuilt.current(), engine.current());
        assert_eq!(rebuilt.innings(InningsNumber::First), engine.innings(InningsNumber::First));
        assert_eq!(rebuilt.roles(), engine.roles());
    }

    #[derive(Debug, Clone, Copy)]
    enum Kind {
        Runs(i32),
        Wide,
        NoBall(i32),
        Bye(i32),
        Wicket,
    }

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            6 => (0..=6i32).prop_map(Kind::Runs),
            1 => Just(Kind::Wide),
            1 => (0..=4i32).prop_map(Kind::NoBall),
            1 => (1..=4i32).prop_map(Kind::Bye),
            1 => Just(Kind::Wicket),
        ]
    }

    fn input(kind: Kind) -> BallInput {
        match kind {
            Kind::Runs(r) => BallInput::score(r),
            Kind::Wide => BallInput::wide(),
            Kind::NoBall(r) => BallInput::no_ball(r),
            Kind::Bye(r) => BallInput::bye(r),
            Kind::Wicket => BallInput::wicket(),
        }
    }

    /// Answer whatever the engine asked for so play can continue.
    fn respond(engine: &mut ScoringEngine, decision: &Decision) {
        if matches!(decision, Decision::BatsmanNeeded { .. }) {
            let next = engine.eligible_batters()[0];
            engine.select_batsman(next).unwrap();
        }
        if decision.needs_bowler() {
            let bowlers = ids(engine, engine.current().bowling_team);
            let over = engine.current().counter.completed_overs() as usize;
            engine.select_bowler(bowlers[over % bowlers.len()]).unwrap();
        }
    }

    fn eleven() -> Vec<&'static str> {
        vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"]
    }

    proptest! {
        #[test]
        fn totals_always_match_the_ledger(kinds in proptest::collection::vec(kind(), 1..120)) {
            let names = eleven();
            let mut engine = started(&names, &names, MatchConfig::default().with_overs(10));

            for k in kinds {
                let outcome = engine.apply_ball(input(k)).unwrap();
                let balls = engine.ledger().innings(InningsNumber::First);
                let runs: u32 = balls.iter().map(|b| b.runs).sum();
                let wickets = balls.iter().filter(|b| b.is_wicket).count() as u32;
                let legal = balls.iter().filter(|b| b.consumes_ball()).count() as u32;

                prop_assert_eq!(outcome.score.runs, runs);
                prop_assert_eq!(outcome.score.wickets, wickets);
                prop_assert_eq!(engine.current().counter.legal_balls(), legal);
                prop_assert!(engine.current().counter.balls_in_over() < 6);

                if outcome.decision.is_terminal() {
                    break;
                }
                respond(&mut engine, &outcome.decision);
            }
        }

        #[test]
        fn undo_is_the_inverse_of_apply(
            prefix in proptest::collection::vec(kind(), 0..40),
            last in kind(),
        ) {
            let names = eleven();
            let mut engine = started(&names, &names, MatchConfig::default().with_overs(20));
            for k in prefix {
                let outcome = engine.apply_ball(input(k)).unwrap();
                if outcome.decision.is_terminal() {
                    return Ok(());
                }
                respond(&mut engine, &outcome.decision);
            }

            let before = engine.clone();
            engine.apply_ball(input(last)).unwrap();
            let undone = engine.undo_last_ball().unwrap();

            prop_assert!(undone.is_some());
            prop_assert_eq!(engine.current(), before.current());
            prop_assert_eq!(engine.roles(), before.roles());
            prop_assert_eq!(engine.out_set(), before.out_set());
            prop_assert_eq!(engine.ledger(), before.ledger());
            prop_assert_eq!(engine.phase(), before.phase());
        }
    }
}
