//! Append-only ball ledger.
//!
//! The ledger is the source of truth for undo, replay and derived statistics.
//! It only grows at the tail and only shrinks by removing the tail.

use serde::{Deserialize, Serialize};

use crease_core::{DomainError, DomainResult};

use crate::ball::{BallEvent, InningsNumber};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallLedger {
    balls: Vec<BallEvent>,
}

impl BallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored events, checking the ordering rules.
    pub fn from_events(balls: Vec<BallEvent>) -> DomainResult<Self> {
        let mut ledger = Self::new();
        for ball in balls {
            if ball.sequence_id != ledger.next_sequence_id() {
                return Err(DomainError::validation(format!(
                    "ledger sequence gap: expected {}, found {}",
                    ledger.next_sequence_id(),
                    ball.sequence_id
                )));
            }
            if let Some(last) = ledger.last() {
                if ball.innings < last.innings {
                    return Err(DomainError::validation(format!(
                        "ball {} belongs to innings {} after innings {} began",
                        ball.sequence_id, ball.innings, last.innings
                    )));
                }
            }
            ledger.balls.push(ball);
        }
        Ok(ledger)
    }

    pub fn next_sequence_id(&self) -> u64 {
        self.balls.last().map(|b| b.sequence_id + 1).unwrap_or(1)
    }

    /// Append a ball built by the engine against `next_sequence_id`.
    pub(crate) fn append(&mut self, ball: BallEvent) {
        debug_assert_eq!(ball.sequence_id, self.next_sequence_id());
        self.balls.push(ball);
    }

    /// Remove the most recent ball if it belongs to `innings`.
    pub(crate) fn pop_last(&mut self, innings: InningsNumber) -> Option<BallEvent> {
        match self.balls.last() {
            Some(b) if b.innings == innings => self.balls.pop(),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&BallEvent> {
        self.balls.last()
    }

    /// Most recent ball of `innings`, if that innings has any.
    pub fn last_in(&self, innings: InningsNumber) -> Option<&BallEvent> {
        self.innings(innings).last()
    }

    /// Contiguous view of one innings. Balls are stored innings by innings.
    pub fn innings(&self, innings: InningsNumber) -> &[BallEvent] {
        let start = self.balls.partition_point(|b| b.innings < innings);
        let end = self.balls.partition_point(|b| b.innings <= innings);
        &self.balls[start..end]
    }

    pub fn as_slice(&self) -> &[BallEvent] {
        &self.balls
    }

    pub fn iter(&self) -> impl Iterator<Item = &BallEvent> {
        self.balls.iter()
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn into_events(self) -> Vec<BallEvent> {
        self.balls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::ExtraType;
    use chrono::Utc;
    use crease_core::PlayerId;

    fn ball(seq: u64, innings: InningsNumber) -> BallEvent {
        BallEvent {
            sequence_id: seq,
            innings,
            over: 1,
            ball_in_over: 1,
            runs: 1,
            extra: ExtraType::None,
            is_wicket: false,
            striker_id: PlayerId::new(),
            non_striker_id: None,
            bowler_id: PlayerId::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn innings_view_is_contiguous() {
        let ledger = BallLedger::from_events(vec![
            ball(1, InningsNumber::First),
            ball(2, InningsNumber::First),
            ball(3, InningsNumber::Second),
        ])
        .unwrap();

        assert_eq!(ledger.innings(InningsNumber::First).len(), 2);
        assert_eq!(ledger.innings(InningsNumber::Second).len(), 1);
        assert_eq!(ledger.next_sequence_id(), 4);
    }

    #[test]
    fn pop_never_reaches_into_previous_innings() {
        let mut ledger = BallLedger::from_events(vec![ball(1, InningsNumber::First)]).unwrap();
        assert!(ledger.pop_last(InningsNumber::Second).is_none());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.pop_last(InningsNumber::First).is_some());
        assert!(ledger.is_empty());
    }

    #[test]
    fn gaps_and_innings_regressions_are_rejected() {
        assert!(BallLedger::from_events(vec![ball(2, InningsNumber::First)]).is_err());
        assert!(
            BallLedger::from_events(vec![
                ball(1, InningsNumber::Second),
                ball(2, InningsNumber::First),
            ])
            .is_err()
        );
    }
}
