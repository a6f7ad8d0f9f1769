//! Ball input surface: what the scorer taps, before validation.

use serde::{Deserialize, Serialize};

use crease_core::{DomainError, DomainResult};

use crate::ball::ExtraType;

/// Upper bound on runs from one delivery (a six off a no-ball).
pub const MAX_RUNS_PER_DELIVERY: u32 = 7;

/// Raw delivery outcome as entered by the scorer.
///
/// `runs` is signed so malformed input can be rejected with a validation
/// error instead of failing to deserialize.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallInput {
    pub runs: i32,
    #[serde(default)]
    pub extra: ExtraType,
    #[serde(default)]
    pub is_wicket: bool,
}

impl BallInput {
    pub fn new(runs: i32, extra: ExtraType, is_wicket: bool) -> Self {
        Self {
            runs,
            extra,
            is_wicket,
        }
    }

    /// Runs off the bat. The scoring pad offers 1, 2, 3, 4 and 6; any total
    /// up to [`MAX_RUNS_PER_DELIVERY`] is accepted so overthrows (5, or a
    /// boundary after running) can be recorded.
    pub fn score(runs: i32) -> Self {
        Self::new(runs, ExtraType::None, false)
    }

    pub fn dot() -> Self {
        Self::score(0)
    }

    /// No-ball: one penalty run plus whatever the batters ran or hit.
    pub fn no_ball(runs_run: i32) -> Self {
        Self::new(runs_run.saturating_add(1), ExtraType::NoBall, false)
    }

    pub fn wide() -> Self {
        Self::wide_with_runs(0)
    }

    /// Wide where the batters also ran (or the ball reached the boundary).
    pub fn wide_with_runs(runs_run: i32) -> Self {
        Self::new(runs_run.saturating_add(1), ExtraType::Wide, false)
    }

    pub fn bye(runs: i32) -> Self {
        Self::new(runs, ExtraType::Bye, false)
    }

    pub fn leg_bye(runs: i32) -> Self {
        Self::new(runs, ExtraType::LegBye, false)
    }

    /// Striker dismissed, no runs.
    pub fn wicket() -> Self {
        Self::new(0, ExtraType::None, true)
    }

    /// Check the input and return the delivery total.
    pub fn validate(&self) -> DomainResult<u32> {
        if self.runs < 0 {
            return Err(DomainError::validation("runs cannot be negative"));
        }
        let runs = self.runs as u32;
        if runs > MAX_RUNS_PER_DELIVERY {
            return Err(DomainError::validation(format!(
                "runs cannot exceed {MAX_RUNS_PER_DELIVERY} for a single delivery"
            )));
        }
        if runs < self.extra.penalty() {
            return Err(DomainError::validation(
                "wides and no-balls must include the one-run penalty",
            ));
        }
        if self.is_wicket && self.extra == ExtraType::NoBall {
            return Err(DomainError::validation(
                "the striker cannot be dismissed off a no-ball",
            ));
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_runs_are_rejected() {
        let err = BallInput::score(-1).validate().unwrap_err();
        assert_eq!(err, DomainError::validation("runs cannot be negative"));
    }

    #[test]
    fn no_ball_folds_penalty_into_total() {
        assert_eq!(BallInput::no_ball(2).validate().unwrap(), 3);
        assert_eq!(BallInput::wide().validate().unwrap(), 1);
    }

    #[test]
    fn wide_without_penalty_is_rejected() {
        let input = BallInput::new(0, ExtraType::Wide, false);
        assert!(matches!(input.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn wicket_off_no_ball_is_rejected() {
        let input = BallInput::new(1, ExtraType::NoBall, true);
        assert!(input.validate().is_err());
    }

    #[test]
    fn runs_above_ceiling_are_rejected() {
        assert!(BallInput::no_ball(6).validate().is_ok());
        assert!(BallInput::score(8).validate().is_err());
    }

    #[test]
    fn overthrow_totals_are_accepted() {
        assert_eq!(BallInput::score(5).validate().unwrap(), 5);
        assert_eq!(BallInput::score(7).validate().unwrap(), 7);
        assert_eq!(BallInput::dot().validate().unwrap(), 0);
    }
}
