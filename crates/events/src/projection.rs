use crate::Event;

/// A projection builds a read model from an append-only event stream.
///
/// Read models are **disposable**: they can be dropped and rebuilt from the
/// stream at any time, because the stream is the source of truth. Scorecards
/// for a stored match are recomputed this way when only the ball ledger
/// survived.
///
/// ## Idempotency
///
/// Replaying the same stream into a fresh projection must always produce the
/// same read model. `ProjectionRunner` additionally rejects events that go
/// backwards in the stream, so a projection never double-counts.
///
/// ## Error Handling
///
/// `apply` doesn't return errors. Events that are irrelevant to the
/// projection are ignored. For sequencing checks, drive the projection
/// through `ProjectionRunner::apply`, which returns `ProjectionError`.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    fn apply(&mut self, event: &Self::Ev);
}
