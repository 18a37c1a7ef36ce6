// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One signed-in household: the committed snapshot, its derived totals and
//! the way it gets persisted. Each mutation is applied as a single step:
//! the store builds the next snapshot, it is committed with a bumped
//! revision, and only then is it handed to persistence.

use crate::auth::Session;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Snapshot;
use crate::persistence::SnapshotStore;
use crate::store::{Clock, LedgerStore, SystemClock};
use crate::sync::{RetryPolicy, SyncQueue, SyncState, save_with_retry};
use crate::totals::{Totals, TotalsCache, TotalsConfig};
use chrono::NaiveDate;
use log::info;

pub enum Persistence {
    /// Save synchronously after each commit, retrying per the policy.
    Direct {
        store: Box<dyn SnapshotStore>,
        policy: RetryPolicy,
    },
    /// Hand snapshots to a background queue.
    Queued(SyncQueue),
    /// Keep everything in memory.
    Detached,
}

pub struct Household<C: Clock = SystemClock> {
    user_id: Option<String>,
    snapshot: Snapshot,
    seeded: bool,
    store: LedgerStore<C>,
    config: TotalsConfig,
    cache: TotalsCache,
    persistence: Persistence,
    direct_failure: Option<SyncState>,
}

impl<C: Clock> Household<C> {
    pub fn new(
        user_id: Option<String>,
        snapshot: Snapshot,
        store: LedgerStore<C>,
        config: TotalsConfig,
        persistence: Persistence,
    ) -> Self {
        Household {
            user_id,
            snapshot,
            seeded: false,
            store,
            config,
            cache: TotalsCache::new(),
            persistence,
            direct_failure: None,
        }
    }

    /// Load the signed-in user's snapshot, seeding defaults when none is stored.
    pub fn load(
        session: Option<&Session>,
        source: &dyn SnapshotStore,
        store: LedgerStore<C>,
        config: TotalsConfig,
    ) -> LedgerResult<Self> {
        let session = session.ok_or(LedgerError::Unauthorized)?;
        let (snapshot, seeded) = fetch(session, source)?;
        let mut h = Household::new(
            Some(session.user_id.clone()),
            snapshot,
            store,
            config,
            Persistence::Detached,
        );
        h.seeded = seeded;
        Ok(h)
    }

    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = persistence;
        self.direct_failure = None;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn was_seeded(&self) -> bool {
        self.seeded
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Follow session changes. Signing out locks and clears the ledger;
    /// signing in as someone else swaps in that user's stored snapshot.
    pub fn on_session_change(
        &mut self,
        session: Option<&Session>,
        source: &dyn SnapshotStore,
    ) -> LedgerResult<()> {
        if session.map(|s| s.user_id.as_str()) == self.user_id.as_deref() {
            return Ok(());
        }
        self.user_id = None;
        self.snapshot = Snapshot::default();
        self.seeded = false;
        self.cache = TotalsCache::new();
        self.direct_failure = None;
        if let Some(session) = session {
            let (snapshot, seeded) = fetch(session, source)?;
            self.snapshot = snapshot;
            self.seeded = seeded;
            self.user_id = Some(session.user_id.clone());
        }
        Ok(())
    }

    /// Apply one mutation and return the value it produced (usually a new id).
    pub fn apply_with<T, F>(&mut self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&LedgerStore<C>, &Snapshot) -> LedgerResult<(Snapshot, T)>,
    {
        let user_id = self.user_id.clone().ok_or(LedgerError::Unauthorized)?;
        let (mut next, out) = f(&self.store, &self.snapshot)?;
        next.revision = self.snapshot.revision + 1;
        self.snapshot = next;
        self.seeded = false;
        self.persist(&user_id)?;
        Ok(out)
    }

    pub fn apply<F>(&mut self, f: F) -> LedgerResult<&Snapshot>
    where
        F: FnOnce(&LedgerStore<C>, &Snapshot) -> LedgerResult<Snapshot>,
    {
        self.apply_with(|st, s| f(st, s).map(|n| (n, ())))?;
        Ok(&self.snapshot)
    }

    fn persist(&mut self, user_id: &str) -> LedgerResult<()> {
        match &self.persistence {
            Persistence::Direct { store, policy } => {
                self.direct_failure =
                    match save_with_retry(store.as_ref(), user_id, &self.snapshot, *policy) {
                        Ok(()) => None,
                        Err((attempts, message)) => Some(SyncState::Failed {
                            revision: self.snapshot.revision,
                            attempts,
                            message,
                        }),
                    };
                Ok(())
            }
            Persistence::Queued(q) => q.submit(user_id, self.snapshot.clone()),
            Persistence::Detached => Ok(()),
        }
    }

    pub fn totals(&mut self, as_of: NaiveDate) -> Totals {
        self.cache.get(&self.snapshot, &self.config, as_of)
    }

    pub fn totals_today(&mut self) -> Totals {
        let today = self.store.today();
        self.totals(today)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    pub fn sync_state(&self) -> SyncState {
        match &self.persistence {
            Persistence::Direct { .. } => self.direct_failure.clone().unwrap_or(SyncState::Idle),
            Persistence::Queued(q) => q.state(),
            Persistence::Detached => SyncState::Idle,
        }
    }

    /// Wait for queued saves, then report the sync state.
    pub fn flush(&self) -> SyncState {
        match &self.persistence {
            Persistence::Queued(q) => q.flush(),
            _ => self.sync_state(),
        }
    }
}

fn fetch(session: &Session, source: &dyn SnapshotStore) -> LedgerResult<(Snapshot, bool)> {
    match source.load(&session.user_id)? {
        Some(s) => Ok((s, false)),
        None => {
            info!("no stored ledger for {}, starting from defaults", session.email);
            Ok((Snapshot::seeded(), true))
        }
    }
}
