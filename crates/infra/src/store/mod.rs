//! Match persistence.
//!
//! Stores are synchronous and shared (`Send + Sync`). The engine never waits
//! on them: snapshots are handed to [`crate::writer::SnapshotWriter`] after a
//! transition has already been applied in memory.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use crease_core::{ExpectedVersion, MatchId};
use crease_scoring::{FinalScores, MatchSetup, MatchSnapshot};

pub use file::FileMatchStore;
pub use in_memory::InMemoryMatchStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("match not found: {0}")]
    NotFound(MatchId),

    #[error("match already registered: {0}")]
    AlreadyExists(MatchId),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same write could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}

pub trait MatchStore: Send + Sync {
    /// Record the roster and rules for a new match.
    fn register_match(&self, match_id: MatchId, setup: &MatchSetup) -> Result<(), StoreError>;

    fn load_roster(&self, match_id: MatchId) -> Result<MatchSetup, StoreError>;

    /// Persist a snapshot.
    ///
    /// `expected` is checked against the version of the snapshot already
    /// stored. With nothing stored yet, only `Exact(v)` for `v > 0` fails.
    fn save_snapshot(
        &self,
        match_id: MatchId,
        snapshot: &MatchSnapshot,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn load_snapshot(&self, match_id: MatchId) -> Result<Option<MatchSnapshot>, StoreError>;

    fn mark_match_complete(&self, match_id: MatchId, scores: &FinalScores)
    -> Result<(), StoreError>;

    fn final_scores(&self, match_id: MatchId) -> Result<Option<FinalScores>, StoreError>;

    /// Every registered match, oldest id first.
    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError>;
}

impl<T> MatchStore for Arc<T>
where
    T: MatchStore + ?Sized,
{
    fn register_match(&self, match_id: MatchId, setup: &MatchSetup) -> Result<(), StoreError> {
        (**self).register_match(match_id, setup)
    }

    fn load_roster(&self, match_id: MatchId) -> Result<MatchSetup, StoreError> {
        (**self).load_roster(match_id)
    }

    fn save_snapshot(
        &self,
        match_id: MatchId,
        snapshot: &MatchSnapshot,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).save_snapshot(match_id, snapshot, expected)
    }

    fn load_snapshot(&self, match_id: MatchId) -> Result<Option<MatchSnapshot>, StoreError> {
        (**self).load_snapshot(match_id)
    }

    fn mark_match_complete(
        &self,
        match_id: MatchId,
        scores: &FinalScores,
    ) -> Result<(), StoreError> {
        (**self).mark_match_complete(match_id, scores)
    }

    fn final_scores(&self, match_id: MatchId) -> Result<Option<FinalScores>, StoreError> {
        (**self).final_scores(match_id)
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        (**self).list_matches()
    }
}

/// Shared version check for snapshot saves.
pub(crate) fn check_expected(
    stored: Option<u64>,
    expected: ExpectedVersion,
) -> Result<(), StoreError> {
    match (stored, expected) {
        (Some(current), _) if !expected.matches(current) => Err(StoreError::Concurrency(format!(
            "expected {expected:?}, found {current}"
        ))),
        (None, ExpectedVersion::Exact(v)) if v > 0 => Err(StoreError::Concurrency(format!(
            "expected {expected:?}, found no snapshot"
        ))),
        _ => Ok(()),
    }
}
