// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Background save pipeline. Snapshots are saved one at a time in the order
//! they were submitted, retried with exponential backoff, and a save that
//! keeps failing leaves the queue in the `Failed` state until a later save
//! succeeds.

use crate::error::{LedgerError, LedgerResult};
use crate::models::Snapshot;
use crate::persistence::{SaveOutcome, SnapshotStore};
use log::{debug, error, warn};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Pending {
        queued: usize,
    },
    Failed {
        revision: u64,
        attempts: u32,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base...
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

enum Job {
    Save { user_id: String, snapshot: Snapshot },
    Flush(Sender<()>),
}

#[derive(Debug, Default)]
struct Shared {
    queued: usize,
    failure: Option<(u64, u32, String)>,
}

impl Shared {
    fn state(&self) -> SyncState {
        if let Some((revision, attempts, message)) = &self.failure {
            return SyncState::Failed {
                revision: *revision,
                attempts: *attempts,
                message: message.clone(),
            };
        }
        if self.queued > 0 {
            SyncState::Pending {
                queued: self.queued,
            }
        } else {
            SyncState::Idle
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|p| p.into_inner())
}

pub struct SyncQueue {
    tx: Option<Sender<Job>>,
    shared: Arc<Mutex<Shared>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncQueue {
    pub fn start(store: Arc<dyn SnapshotStore>, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("nexus-sync".into())
            .spawn(move || run(rx, store, policy, worker_shared))
            .ok();
        if worker.is_none() {
            error!("could not start sync worker; saves will be rejected");
        }
        SyncQueue {
            tx: worker.as_ref().map(|_| tx),
            shared,
            worker,
        }
    }

    /// Queue a full snapshot save behind every save submitted before it.
    pub fn submit(&self, user_id: &str, snapshot: Snapshot) -> LedgerResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| LedgerError::Persistence("sync worker is not running".into()))?;
        lock(&self.shared).queued += 1;
        let job = Job::Save {
            user_id: user_id.to_string(),
            snapshot,
        };
        if tx.send(job).is_err() {
            lock(&self.shared).queued -= 1;
            return Err(LedgerError::Persistence("sync worker stopped".into()));
        }
        Ok(())
    }

    pub fn state(&self) -> SyncState {
        lock(&self.shared).state()
    }

    /// Block until everything submitted so far has been processed.
    pub fn flush(&self) -> SyncState {
        if let Some(tx) = &self.tx {
            let (done_tx, done_rx) = mpsc::channel();
            if tx.send(Job::Flush(done_tx)).is_ok() {
                let _ = done_rx.recv();
            }
        }
        self.state()
    }
}

impl Drop for SyncQueue {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(w) = self.worker.take() {
            let _ = w.join();
        }
    }
}

fn run(rx: Receiver<Job>, store: Arc<dyn SnapshotStore>, policy: RetryPolicy, shared: Arc<Mutex<Shared>>) {
    for job in rx {
        match job {
            Job::Save { user_id, snapshot } => {
                let result = save_with_retry(store.as_ref(), &user_id, &snapshot, policy);
                let mut s = lock(&shared);
                s.queued = s.queued.saturating_sub(1);
                match result {
                    Ok(()) => s.failure = None,
                    Err((attempts, message)) => {
                        s.failure = Some((snapshot.revision, attempts, message));
                    }
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

pub(crate) fn save_with_retry(
    store: &dyn SnapshotStore,
    user_id: &str,
    snapshot: &Snapshot,
    policy: RetryPolicy,
) -> Result<(), (u32, String)> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.save(user_id, snapshot) {
            Ok(SaveOutcome::Saved) => {
                debug!("saved revision {} for {}", snapshot.revision, user_id);
                return Ok(());
            }
            Ok(SaveOutcome::Stale { stored_revision }) => {
                warn!(
                    "revision {} for {} is older than stored revision {}; skipped",
                    snapshot.revision, user_id, stored_revision
                );
                return Ok(());
            }
            Err(e) if attempt < max => {
                warn!(
                    "save of revision {} failed (attempt {}/{}): {}",
                    snapshot.revision, attempt, max, e
                );
                thread::sleep(policy.delay(attempt));
                attempt += 1;
            }
            Err(e) => {
                error!(
                    "giving up on revision {} after {} attempts: {}",
                    snapshot.revision, attempt, e
                );
                return Err((attempt, e.to_string()));
            }
        }
    }
}
