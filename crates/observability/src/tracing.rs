//! Tracing/logging initialization.
//!
//! JSON lines by default, filtered through `RUST_LOG`. Set
//! `CREASE_LOG_FORMAT=compact` for human-readable output during local runs.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

impl LogFormat {
    /// Parse a `CREASE_LOG_FORMAT` value; anything unrecognised is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "compact" || v == "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize with settings taken from the environment.
pub fn init() {
    let format = LogFormat::parse(std::env::var("CREASE_LOG_FORMAT").ok().as_deref());
    init_with(format, DEFAULT_DIRECTIVE);
}

/// Initialize with an explicit format and fallback filter directive.
///
/// `RUST_LOG` still takes precedence over `default_directive`.
pub fn init_with(format: LogFormat, default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
    };
    if installed {
        ::tracing::debug!(?format, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("yaml")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Compact ")), LogFormat::Compact);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_with(LogFormat::Compact, "warn");
        init_with(LogFormat::Json, "debug");
    }
}
