//! Infrastructure layer: match stores, background persistence, sessions
//! and process settings.

pub mod retry;
pub mod session;
pub mod settings;
pub mod store;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use retry::{BackoffStrategy, RetryPolicy};
pub use session::SessionRegistry;
pub use settings::ScorerSettings;
pub use store::{FileMatchStore, InMemoryMatchStore, MatchStore, StoreError};
pub use writer::{PersistenceStatus, SnapshotWriter};
