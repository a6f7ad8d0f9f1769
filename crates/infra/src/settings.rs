//! Process settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::retry::RetryPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SAVE_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_SAVE_BASE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerSettings {
    pub bind_addr: String,
    /// File-backed store location; in-memory store when unset.
    pub data_dir: Option<PathBuf>,
    pub save_max_attempts: u32,
    pub save_base_delay: Duration,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: None,
            save_max_attempts: DEFAULT_SAVE_MAX_ATTEMPTS,
            save_base_delay: Duration::from_millis(DEFAULT_SAVE_BASE_DELAY_MS),
        }
    }
}

impl ScorerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or malformed values fall
    /// back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("CREASE_BIND_ADDR").unwrap_or_else(|| {
            warn!("CREASE_BIND_ADDR not set, using default {DEFAULT_BIND_ADDR}");
            DEFAULT_BIND_ADDR.to_string()
        });

        let data_dir = lookup("CREASE_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        let save_max_attempts = parse_or(
            &lookup,
            "CREASE_SAVE_MAX_ATTEMPTS",
            DEFAULT_SAVE_MAX_ATTEMPTS,
        )
        .max(1);
        let save_base_delay = Duration::from_millis(parse_or(
            &lookup,
            "CREASE_SAVE_BASE_DELAY_MS",
            DEFAULT_SAVE_BASE_DELAY_MS,
        ));

        Self {
            bind_addr,
            data_dir,
            save_max_attempts,
            save_base_delay,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.save_max_attempts,
            self.save_base_delay,
            self.save_base_delay * 50,
        )
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(%key, value = %raw, "invalid setting, using default {default}");
            default
        }),
    }
}
