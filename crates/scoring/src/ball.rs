use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crease_core::PlayerId;
use crease_events::Event;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InningsNumber {
    First,
    Second,
}

impl InningsNumber {
    pub fn as_u8(self) -> u8 {
        match self {
            InningsNumber::First => 1,
            InningsNumber::Second => 2,
        }
    }
}

impl core::fmt::Display for InningsNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Classification of a delivery.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraType {
    #[default]
    None,
    Wide,
    NoBall,
    Bye,
    LegBye,
}

impl ExtraType {
    /// Whether the delivery counts towards the six balls of an over.
    pub fn consumes_ball(self) -> bool {
        !matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }

    /// Penalty run included in the delivery total.
    pub fn penalty(self) -> u32 {
        match self {
            ExtraType::Wide | ExtraType::NoBall => 1,
            _ => 0,
        }
    }

    pub fn is_extra(self) -> bool {
        self != ExtraType::None
    }
}

/// One delivery, exactly as it happened. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallEvent {
    pub sequence_id: u64,
    pub innings: InningsNumber,
    /// 1-based over number.
    pub over: u32,
    /// Legal-ball ordinal within the over (1..=6). Wides and no-balls carry the
    /// ordinal of the next legal ball.
    pub ball_in_over: u8,
    /// Total runs for the delivery, penalty included.
    pub runs: u32,
    pub extra: ExtraType,
    pub is_wicket: bool,
    pub striker_id: PlayerId,
    pub non_striker_id: Option<PlayerId>,
    pub bowler_id: PlayerId,
    pub recorded_at: DateTime<Utc>,
}

impl BallEvent {
    pub fn consumes_ball(&self) -> bool {
        self.extra.consumes_ball()
    }

    /// Runs physically run (or hit) by the batters, penalty excluded.
    pub fn runs_run(&self) -> u32 {
        self.runs.saturating_sub(self.extra.penalty())
    }

    /// Runs credited to the striker's personal tally.
    pub fn batter_runs(&self) -> u32 {
        match self.extra {
            ExtraType::None | ExtraType::NoBall => self.runs_run(),
            _ => 0,
        }
    }

    /// Whether the striker is charged with a ball faced.
    pub fn is_ball_faced(&self) -> bool {
        self.consumes_ball()
    }
}

impl Event for BallEvent {
    fn event_type(&self) -> &'static str {
        "scoring.ball.recorded"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn sequence_number(&self) -> u64 {
        self.sequence_id
    }
}
