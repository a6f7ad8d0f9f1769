use chrono::{DateTime, Utc};

/// A domain-agnostic, append-only fact.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - **ordered** by a stream-local sequence number
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "scoring.ball.recorded").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (wall-clock time of the scorer).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Monotonically increasing position in the owning stream (starts at 1).
    fn sequence_number(&self) -> u64;
}
