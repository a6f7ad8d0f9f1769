use serde::{Deserialize, Serialize};

/// Legal deliveries in an over.
pub const BALLS_PER_OVER: u8 = 6;

/// Over/ball position within an innings.
///
/// `balls_in_over` counts legal deliveries already bowled in the current
/// over (0..=5). Wides and no-balls never touch the counter.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverCounter {
    completed_overs: u32,
    balls_in_over: u8,
}

impl OverCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter positioned after `legal_balls` legal deliveries.
    pub fn from_legal_balls(legal_balls: u32) -> Self {
        Self {
            completed_overs: legal_balls / BALLS_PER_OVER as u32,
            balls_in_over: (legal_balls % BALLS_PER_OVER as u32) as u8,
        }
    }

    pub fn completed_overs(&self) -> u32 {
        self.completed_overs
    }

    pub fn balls_in_over(&self) -> u8 {
        self.balls_in_over
    }

    /// 1-based number of the over in progress.
    pub fn current_over(&self) -> u32 {
        self.completed_overs + 1
    }

    /// 1-based ordinal the next legal delivery will carry.
    pub fn next_ball(&self) -> u8 {
        self.balls_in_over + 1
    }

    pub fn legal_balls(&self) -> u32 {
        self.completed_overs * BALLS_PER_OVER as u32 + self.balls_in_over as u32
    }

    /// Count one legal delivery. Returns true when it completes the over.
    pub fn advance(&mut self) -> bool {
        self.balls_in_over += 1;
        if self.balls_in_over == BALLS_PER_OVER {
            self.balls_in_over = 0;
            self.completed_overs += 1;
            true
        } else {
            false
        }
    }

    /// Inverse of `advance`. A no-op at the start of the innings.
    pub fn retreat(&mut self) {
        if self.balls_in_over > 0 {
            self.balls_in_over -= 1;
        } else if self.completed_overs > 0 {
            self.completed_overs -= 1;
            self.balls_in_over = BALLS_PER_OVER - 1;
        }
    }
}

/// Scorebook notation, e.g. `3.4`.
impl core::fmt::Display for OverCounter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.completed_overs, self.balls_in_over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_legal_ball_completes_the_over() {
        let mut c = OverCounter::new();
        for _ in 0..5 {
            assert!(!c.advance());
        }
        assert_eq!(c.to_string(), "0.5");
        assert!(c.advance());
        assert_eq!(c.completed_overs(), 1);
        assert_eq!(c.balls_in_over(), 0);
        assert_eq!(c.current_over(), 2);
    }

    #[test]
    fn retreat_rolls_back_over_boundary() {
        let mut c = OverCounter::from_legal_balls(6);
        c.retreat();
        assert_eq!(c.completed_overs(), 0);
        assert_eq!(c.balls_in_over(), 5);
    }

    #[test]
    fn retreat_at_start_is_a_no_op() {
        let mut c = OverCounter::new();
        c.retreat();
        assert_eq!(c, OverCounter::new());
    }

    #[test]
    fn legal_balls_round_trips() {
        for n in [0, 1, 5, 6, 7, 119, 120] {
            assert_eq!(OverCounter::from_legal_balls(n).legal_balls(), n);
        }
    }
}
