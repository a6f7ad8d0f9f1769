//! Background snapshot persistence.
//!
//! The scorer hands each post-transition snapshot to [`SnapshotWriter::submit`]
//! and carries on. A dedicated thread drains the queue, keeps only the newest
//! snapshot per match, and retries failed saves according to a
//! [`RetryPolicy`]. Outcomes are published as [`PersistenceStatus`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock, mpsc};
use std::thread;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crease_core::{ExpectedVersion, MatchId};
use crease_scoring::{FinalScores, MatchSnapshot};

use crate::retry::RetryPolicy;
use crate::store::{MatchStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistenceStatus {
    /// Nothing submitted for this match yet.
    Idle,
    Pending {
        version: u64,
    },
    Saved {
        version: u64,
        saved_at: DateTime<Utc>,
    },
    /// Retries exhausted; the snapshot is kept and retried on the next
    /// submit or flush.
    Failed {
        version: u64,
        error: String,
        attempts: u32,
    },
}

#[derive(Debug)]
struct SaveJob {
    snapshot: MatchSnapshot,
    final_scores: Option<FinalScores>,
}

enum Message {
    Save(Box<SaveJob>),
    Flush(mpsc::Sender<()>),
    Shutdown,
}

type Statuses = Arc<RwLock<HashMap<MatchId, PersistenceStatus>>>;

/// Handle to the background writer thread. Dropping it drains the queue
/// and stops the thread.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: mpsc::Sender<Message>,
    statuses: Statuses,
    join: Mutex<Option<thread::JoinHandle<()>>>,
}

impl SnapshotWriter {
    pub fn spawn<S>(store: S, policy: RetryPolicy) -> Result<Self, StoreError>
    where
        S: MatchStore + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let statuses: Statuses = Arc::default();
        let worker = Worker {
            store,
            policy,
            statuses: statuses.clone(),
            queue: BTreeMap::new(),
        };
        let join = thread::Builder::new()
            .name("snapshot-writer".to_string())
            .spawn(move || worker.run(rx))?;

        Ok(Self {
            tx,
            statuses,
            join: Mutex::new(Some(join)),
        })
    }

    /// Queue a snapshot for saving. `final_scores` is recorded alongside
    /// once the match is complete.
    pub fn submit(&self, snapshot: MatchSnapshot, final_scores: Option<FinalScores>) {
        let match_id = snapshot.match_id;
        let version = snapshot.version;
        set_status(&self.statuses, match_id, PersistenceStatus::Pending { version });

        let job = SaveJob {
            snapshot,
            final_scores,
        };
        if self.tx.send(Message::Save(Box::new(job))).is_err() {
            error!(%match_id, version, "snapshot writer has stopped; snapshot not queued");
            set_status(
                &self.statuses,
                match_id,
                PersistenceStatus::Failed {
                    version,
                    error: "snapshot writer stopped".to_string(),
                    attempts: 0,
                },
            );
        }
    }

    pub fn status(&self, match_id: MatchId) -> PersistenceStatus {
        self.statuses
            .read()
            .ok()
            .and_then(|s| s.get(&match_id).cloned())
            .unwrap_or(PersistenceStatus::Idle)
    }

    /// Block until everything queued has been attempted, retrying anything
    /// left over from earlier failures. Returns the matches still unsaved.
    pub fn flush(&self) -> Vec<MatchId> {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
        self.statuses
            .read()
            .map(|s| {
                s.iter()
                    .filter(|(_, st)| !matches!(st, PersistenceStatus::Saved { .. }))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}

fn set_status(statuses: &Statuses, match_id: MatchId, status: PersistenceStatus) {
    if let Ok(mut s) = statuses.write() {
        s.insert(match_id, status);
    }
}

struct Worker<S> {
    store: S,
    policy: RetryPolicy,
    statuses: Statuses,
    queue: BTreeMap<MatchId, SaveJob>,
}

impl<S: MatchStore> Worker<S> {
    fn run(mut self, rx: mpsc::Receiver<Message>) {
        debug!("snapshot writer started");
        while let Ok(msg) = rx.recv() {
            let mut acks = Vec::new();
            let mut stop = self.accept(msg, &mut acks);
            while let Ok(msg) = rx.try_recv() {
                stop |= self.accept(msg, &mut acks);
            }

            self.drain();

            for ack in acks {
                let _ = ack.send(());
            }
            if stop {
                break;
            }
        }
        if !self.queue.is_empty() {
            warn!(unsaved = self.queue.len(), "snapshot writer stopped with unsaved snapshots");
        }
        debug!("snapshot writer stopped");
    }

    /// Returns true on shutdown.
    fn accept(&mut self, msg: Message, acks: &mut Vec<mpsc::Sender<()>>) -> bool {
        match msg {
            Message::Save(job) => {
                let match_id = job.snapshot.match_id;
                let newer = self
                    .queue
                    .get(&match_id)
                    .is_none_or(|queued| queued.snapshot.version < job.snapshot.version);
                if newer {
                    self.queue.insert(match_id, *job);
                }
                false
            }
            Message::Flush(ack) => {
                acks.push(ack);
                false
            }
            Message::Shutdown => true,
        }
    }

    fn drain(&mut self) {
        let ids: Vec<MatchId> = self.queue.keys().copied().collect();
        for match_id in ids {
            let Some(job) = self.queue.remove(&match_id) else {
                continue;
            };
            if let Err(job) = self.save(job) {
                self.queue.insert(match_id, job);
            }
        }
    }

    /// Save one snapshot, retrying transient failures. Hands the job back
    /// when it should be kept for a later attempt.
    fn save(&self, job: SaveJob) -> Result<(), SaveJob> {
        let match_id = job.snapshot.match_id;
        let version = job.snapshot.version;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.write(&job) {
                Ok(()) => {
                    debug!(%match_id, version, attempt, "snapshot saved");
                    if job.final_scores.is_some() {
                        info!(%match_id, "final scores recorded");
                    }
                    self.mark_saved(match_id, version);
                    return Ok(());
                }
                Err(StoreError::Concurrency(reason)) => {
                    // Something newer is already stored.
                    debug!(%match_id, version, %reason, "skipping superseded snapshot");
                    let stored = match self.store.load_snapshot(match_id) {
                        Ok(Some(snapshot)) => snapshot.version.max(version),
                        _ => version,
                    };
                    self.mark_saved(match_id, stored);
                    return Ok(());
                }
                Err(e) if e.is_transient() && self.policy.should_retry(attempt) => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(%match_id, version, attempt, error = %e, delay_ms = delay.as_millis() as u64, "snapshot save failed; retrying");
                    thread::sleep(delay);
                }
                Err(e) => {
                    error!(%match_id, version, attempts = attempt, error = %e, "snapshot save failed");
                    set_status(
                        &self.statuses,
                        match_id,
                        PersistenceStatus::Failed {
                            version,
                            error: e.to_string(),
                            attempts: attempt,
                        },
                    );
                    return Err(job);
                }
            }
        }
    }

    fn write(&self, job: &SaveJob) -> Result<(), StoreError> {
        let match_id = job.snapshot.match_id;
        // Re-saving the same version is allowed so a retry after a partial
        // write (snapshot stored, final scores not) goes through.
        let expected = ExpectedVersion::Before(job.snapshot.version + 1);
        self.store.save_snapshot(match_id, &job.snapshot, expected)?;
        if let Some(scores) = &job.final_scores {
            self.store.mark_match_complete(match_id, scores)?;
        }
        Ok(())
    }

    fn mark_saved(&self, match_id: MatchId, version: u64) {
        if let Ok(mut s) = self.statuses.write() {
            // A newer submit may already have marked the match pending.
            let superseded =
                matches!(s.get(&match_id), Some(PersistenceStatus::Pending { version: v }) if *v > version);
            if !superseded {
                s.insert(
                    match_id,
                    PersistenceStatus::Saved {
                        version,
                        saved_at: Utc::now(),
                    },
                );
            }
        }
    }
}
