use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crease_core::{DomainError, DomainResult, MatchId, SessionToken};
use crease_infra::{
    FileMatchStore, InMemoryMatchStore, MatchStore, PersistenceStatus, RetryPolicy,
    ScorerSettings, SessionRegistry, SnapshotWriter,
};
use crease_scoring::{MatchSetup, ScoringEngine};

/// Everything the handlers share.
pub struct ScorerServices {
    pub store: Arc<dyn MatchStore>,
    pub registry: SessionRegistry,
    pub writer: SnapshotWriter,
}

impl ScorerServices {
    /// Wire services over `store`, reopening every match it already holds.
    pub fn new(store: Arc<dyn MatchStore>, policy: RetryPolicy) -> anyhow::Result<Self> {
        let writer = SnapshotWriter::spawn(store.clone(), policy)
            .context("failed to start snapshot writer")?;
        let services = Self {
            store,
            registry: SessionRegistry::new(),
            writer,
        };
        let recovered = services.recover()?;
        if recovered > 0 {
            info!(matches = recovered, "recovered stored matches");
        }
        Ok(services)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Self::new(Arc::new(InMemoryMatchStore::new()), RetryPolicy::default())
    }

    pub fn from_settings(settings: &ScorerSettings) -> anyhow::Result<Self> {
        let store: Arc<dyn MatchStore> = match &settings.data_dir {
            Some(dir) => {
                info!(data_dir = %dir.display(), "using file-backed match store");
                Arc::new(
                    FileMatchStore::open(dir)
                        .with_context(|| format!("failed to open {}", dir.display()))?,
                )
            }
            None => {
                tracing::warn!("CREASE_DATA_DIR not set; matches are kept in memory only");
                Arc::new(InMemoryMatchStore::new())
            }
        };
        Self::new(store, settings.retry_policy())
    }

    fn recover(&self) -> anyhow::Result<usize> {
        let ids = self.store.list_matches()?;
        for &match_id in &ids {
            let engine = match self.store.load_snapshot(match_id)? {
                Some(snapshot) => ScoringEngine::restore(snapshot)
                    .with_context(|| format!("stored snapshot for {match_id} is invalid"))?,
                None => ScoringEngine::new(match_id, self.store.load_roster(match_id)?)?,
            };
            self.registry.open(engine)?;
        }
        Ok(ids.len())
    }

    /// Register a new match and open it for scoring.
    pub fn create_match(&self, setup: MatchSetup) -> Result<ScoringEngine, CreateError> {
        let match_id = MatchId::new();
        let engine = ScoringEngine::new(match_id, setup.clone())?;
        self.store.register_match(match_id, &setup)?;
        self.registry.open(engine.clone())?;
        self.persist(&engine);
        info!(%match_id, "match created");
        Ok(engine)
    }

    /// Run a scoring operation for the session owner; persist on success.
    pub fn mutate<T>(
        &self,
        match_id: MatchId,
        token: SessionToken,
        op: impl FnOnce(&mut ScoringEngine) -> DomainResult<T>,
    ) -> DomainResult<T> {
        self.registry
            .with_engine(match_id, token, |engine| {
                let value = op(engine)?;
                self.persist(engine);
                Ok(value)
            })
            .and_then(|r| r)
    }

    pub fn read<T>(&self, match_id: MatchId, f: impl FnOnce(&ScoringEngine) -> T) -> DomainResult<T> {
        self.registry.read(match_id, f)
    }

    pub fn persistence(&self, match_id: MatchId) -> DomainResult<PersistenceStatus> {
        if !self.registry.contains(match_id) {
            return Err(DomainError::not_found());
        }
        Ok(self.writer.status(match_id))
    }

    fn persist(&self, engine: &ScoringEngine) {
        self.writer.submit(engine.snapshot(), engine.final_scores());
    }
}

#[derive(Debug)]
pub enum CreateError {
    Domain(DomainError),
    Store(crease_infra::StoreError),
}

impl From<DomainError> for CreateError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl From<crease_infra::StoreError> for CreateError {
    fn from(e: crease_infra::StoreError) -> Self {
        Self::Store(e)
    }
}
