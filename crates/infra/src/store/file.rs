use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crease_core::{ExpectedVersion, MatchId};
use crease_scoring::{FinalScores, MatchSetup, MatchSnapshot};

use super::{MatchStore, StoreError, check_expected};

const SETUP: &str = "setup";
const SNAPSHOT: &str = "snapshot";
const FINAL: &str = "final";

/// One JSON file per match artifact under a data directory:
/// `<id>.setup.json`, `<id>.snapshot.json` and `<id>.final.json`.
///
/// Writes go to a temp file first and are renamed into place, so a reader
/// never sees a half-written snapshot.
#[derive(Debug)]
pub struct FileMatchStore {
    dir: PathBuf,
    // Serializes read-check-write sequences within this process.
    write_lock: Mutex<()>,
}

impl FileMatchStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, match_id: MatchId, kind: &str) -> PathBuf {
        self.dir.join(format!("{match_id}.{kind}.json"))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "wrote match file");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_registered(&self, match_id: MatchId) -> Result<(), StoreError> {
        if self.path(match_id, SETUP).exists() {
            Ok(())
        } else {
            Err(StoreError::NotFound(match_id))
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl MatchStore for FileMatchStore {
    fn register_match(&self, match_id: MatchId, setup: &MatchSetup) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let path = self.path(match_id, SETUP);
        if path.exists() {
            return Err(StoreError::AlreadyExists(match_id));
        }
        self.write_json(&path, setup)
    }

    fn load_roster(&self, match_id: MatchId) -> Result<MatchSetup, StoreError> {
        Self::read_json(&self.path(match_id, SETUP))?.ok_or(StoreError::NotFound(match_id))
    }

    fn save_snapshot(
        &self,
        match_id: MatchId,
        snapshot: &MatchSnapshot,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.ensure_registered(match_id)?;
        let path = self.path(match_id, SNAPSHOT);
        let stored: Option<MatchSnapshot> = Self::read_json(&path)?;
        check_expected(stored.map(|s| s.version), expected)?;
        self.write_json(&path, snapshot)
    }

    fn load_snapshot(&self, match_id: MatchId) -> Result<Option<MatchSnapshot>, StoreError> {
        self.ensure_registered(match_id)?;
        Self::read_json(&self.path(match_id, SNAPSHOT))
    }

    fn mark_match_complete(
        &self,
        match_id: MatchId,
        scores: &FinalScores,
    ) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.ensure_registered(match_id)?;
        self.write_json(&self.path(match_id, FINAL), scores)
    }

    fn final_scores(&self, match_id: MatchId) -> Result<Option<FinalScores>, StoreError> {
        self.ensure_registered(match_id)?;
        Self::read_json(&self.path(match_id, FINAL))
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        let suffix = format!(".{SETUP}.json");
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) else {
                continue;
            };
            if let Ok(id) = stem.parse::<MatchId>() {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
