use serde::{Deserialize, Serialize};

use crease_core::{DomainError, DomainResult};

use crate::roster::{Roster, TeamSide};

/// Rules a match is played under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Overs allowed per innings.
    pub overs_per_innings: u32,
    /// When true the last remaining batter may bat alone once their partner
    /// is dismissed; the side is all out only when nobody is left.
    /// When false the side is all out as soon as fewer than two batters remain.
    pub last_man_stands: bool,
    /// When true the bowler of the previous over cannot bowl the next one.
    pub forbid_consecutive_overs: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            overs_per_innings: 20,
            last_man_stands: true,
            forbid_consecutive_overs: false,
        }
    }
}

impl MatchConfig {
    pub fn with_overs(mut self, overs: u32) -> Self {
        self.overs_per_innings = overs;
        self
    }

    pub fn with_last_man_stands(mut self, enabled: bool) -> Self {
        self.last_man_stands = enabled;
        self
    }

    pub fn with_forbid_consecutive_overs(mut self, enabled: bool) -> Self {
        self.forbid_consecutive_overs = enabled;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.overs_per_innings == 0 {
            return Err(DomainError::validation("overs_per_innings must be at least 1"));
        }
        Ok(())
    }

    /// Wickets a side can lose before it is all out.
    pub fn max_wickets(&self, squad_size: usize) -> u32 {
        let size = squad_size as u32;
        if self.last_man_stands {
            size
        } else {
            size.saturating_sub(1)
        }
    }
}

/// Everything the engine needs to start scoring a match.
///
/// This is what a `MatchStore` hands back from `load_roster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub roster: Roster,
    pub config: MatchConfig,
    pub batting_first: TeamSide,
}

impl MatchSetup {
    pub fn new(roster: Roster, config: MatchConfig, batting_first: TeamSide) -> Self {
        Self {
            roster,
            config,
            batting_first,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_overs_is_rejected() {
        let err = MatchConfig::default().with_overs(0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn max_wickets_follows_last_man_rule() {
        let config = MatchConfig::default();
        assert_eq!(config.max_wickets(11), 11);
        assert_eq!(config.with_last_man_stands(false).max_wickets(11), 10);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"overs_per_innings": 5}"#).unwrap();
        assert_eq!(config.overs_per_innings, 5);
        assert!(config.last_man_stands);
        assert!(!config.forbid_consecutive_overs);
    }
}
