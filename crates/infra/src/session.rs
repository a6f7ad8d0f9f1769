//! Single-writer ownership of live matches.
//!
//! Each open match is owned by at most one session token. Mutations run
//! under the match's mutex and only for the holder of that token; reads
//! need no token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::info;

use crease_core::{DomainError, DomainResult, MatchId, SessionToken};
use crease_scoring::ScoringEngine;

#[derive(Debug)]
struct LiveMatch {
    engine: Mutex<ScoringEngine>,
    owner: Mutex<Option<SessionToken>>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    matches: RwLock<HashMap<MatchId, Arc<LiveMatch>>>,
}

fn poisoned() -> DomainError {
    DomainError::illegal_state("session lock poisoned")
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a match available for scoring.
    pub fn open(&self, engine: ScoringEngine) -> DomainResult<()> {
        let match_id = engine.match_id();
        let mut matches = self.matches.write().map_err(|_| poisoned())?;
        if matches.contains_key(&match_id) {
            return Err(DomainError::conflict(format!("match {match_id} is already open")));
        }
        matches.insert(
            match_id,
            Arc::new(LiveMatch {
                engine: Mutex::new(engine),
                owner: Mutex::new(None),
            }),
        );
        Ok(())
    }

    pub fn contains(&self, match_id: MatchId) -> bool {
        self.matches
            .read()
            .map(|m| m.contains_key(&match_id))
            .unwrap_or(false)
    }

    fn get(&self, match_id: MatchId) -> DomainResult<Arc<LiveMatch>> {
        self.matches
            .read()
            .map_err(|_| poisoned())?
            .get(&match_id)
            .cloned()
            .ok_or_else(DomainError::not_found)
    }

    /// Take ownership of a match. Fails with `Conflict` while another
    /// session holds it.
    pub fn claim(&self, match_id: MatchId) -> DomainResult<SessionToken> {
        let live = self.get(match_id)?;
        let mut owner = live.owner.lock().map_err(|_| poisoned())?;
        if owner.is_some() {
            return Err(DomainError::conflict(format!(
                "match {match_id} is already being scored"
            )));
        }
        let token = SessionToken::new();
        *owner = Some(token);
        info!(%match_id, "scoring session claimed");
        Ok(token)
    }

    pub fn release(&self, match_id: MatchId, token: SessionToken) -> DomainResult<()> {
        let live = self.get(match_id)?;
        let mut owner = live.owner.lock().map_err(|_| poisoned())?;
        ensure_owner(*owner, token)?;
        *owner = None;
        info!(%match_id, "scoring session released");
        Ok(())
    }

    /// Run `f` against the engine if `token` owns the match.
    pub fn with_engine<R>(
        &self,
        match_id: MatchId,
        token: SessionToken,
        f: impl FnOnce(&mut ScoringEngine) -> R,
    ) -> DomainResult<R> {
        let live = self.get(match_id)?;
        {
            let owner = live.owner.lock().map_err(|_| poisoned())?;
            ensure_owner(*owner, token)?;
        }
        let mut engine = live.engine.lock().map_err(|_| poisoned())?;
        Ok(f(&mut engine))
    }

    /// Read-only access; no session needed.
    pub fn read<R>(&self, match_id: MatchId, f: impl FnOnce(&ScoringEngine) -> R) -> DomainResult<R> {
        let live = self.get(match_id)?;
        let engine = live.engine.lock().map_err(|_| poisoned())?;
        Ok(f(&engine))
    }
}

fn ensure_owner(owner: Option<SessionToken>, token: SessionToken) -> DomainResult<()> {
    match owner {
        Some(current) if current == token => Ok(()),
        _ => Err(DomainError::conflict(
            "session token does not own this match",
        )),
    }
}
