use std::collections::BTreeMap;
use std::sync::RwLock;

use crease_core::{ExpectedVersion, MatchId};
use crease_scoring::{FinalScores, MatchSetup, MatchSnapshot};

use super::{MatchStore, StoreError, check_expected};

#[derive(Debug, Clone)]
struct MatchRecord {
    setup: MatchSetup,
    snapshot: Option<MatchSnapshot>,
    final_scores: Option<FinalScores>,
}

/// In-memory match store.
///
/// Intended for tests/dev and for running the API without a data directory.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: RwLock<BTreeMap<MatchId, MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

impl MatchStore for InMemoryMatchStore {
    fn register_match(&self, match_id: MatchId, setup: &MatchSetup) -> Result<(), StoreError> {
        let mut matches = self.matches.write().map_err(|_| Self::poisoned())?;
        if matches.contains_key(&match_id) {
            return Err(StoreError::AlreadyExists(match_id));
        }
        matches.insert(
            match_id,
            MatchRecord {
                setup: setup.clone(),
                snapshot: None,
                final_scores: None,
            },
        );
        Ok(())
    }

    fn load_roster(&self, match_id: MatchId) -> Result<MatchSetup, StoreError> {
        let matches = self.matches.read().map_err(|_| Self::poisoned())?;
        matches
            .get(&match_id)
            .map(|r| r.setup.clone())
            .ok_or(StoreError::NotFound(match_id))
    }

    fn save_snapshot(
        &self,
        match_id: MatchId,
        snapshot: &MatchSnapshot,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut matches = self.matches.write().map_err(|_| Self::poisoned())?;
        let record = matches
            .get_mut(&match_id)
            .ok_or(StoreError::NotFound(match_id))?;
        check_expected(record.snapshot.as_ref().map(|s| s.version), expected)?;
        record.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self, match_id: MatchId) -> Result<Option<MatchSnapshot>, StoreError> {
        let matches = self.matches.read().map_err(|_| Self::poisoned())?;
        matches
            .get(&match_id)
            .map(|r| r.snapshot.clone())
            .ok_or(StoreError::NotFound(match_id))
    }

    fn mark_match_complete(
        &self,
        match_id: MatchId,
        scores: &FinalScores,
    ) -> Result<(), StoreError> {
        let mut matches = self.matches.write().map_err(|_| Self::poisoned())?;
        let record = matches
            .get_mut(&match_id)
            .ok_or(StoreError::NotFound(match_id))?;
        record.final_scores = Some(scores.clone());
        Ok(())
    }

    fn final_scores(&self, match_id: MatchId) -> Result<Option<FinalScores>, StoreError> {
        let matches = self.matches.read().map_err(|_| Self::poisoned())?;
        matches
            .get(&match_id)
            .map(|r| r.final_scores.clone())
            .ok_or(StoreError::NotFound(match_id))
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        let matches = self.matches.read().map_err(|_| Self::poisoned())?;
        Ok(matches.keys().copied().collect())
    }
}
