// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use nexus_ledger::auth::Session;
use nexus_ledger::error::LedgerError;
use nexus_ledger::household::{Household, Persistence};
use nexus_ledger::models::{Collection, Snapshot};
use nexus_ledger::persistence::{SaveOutcome, SnapshotStore, SqliteSnapshotStore};
use nexus_ledger::store::{FixedClock, LedgerStore, NewRecord};
use nexus_ledger::sync::{RetryPolicy, SyncState};
use nexus_ledger::totals::TotalsConfig;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::time::Duration;

fn mem_store() -> SqliteSnapshotStore {
    SqliteSnapshotStore::new(Connection::open_in_memory().unwrap()).unwrap()
}

fn session() -> Session {
    Session {
        user_id: "u-1".into(),
        email: "alice@example.com".into(),
        started_at: "2025-06-01T08:00:00Z".into(),
    }
}

fn ledger() -> LedgerStore<FixedClock> {
    LedgerStore::with_clock(FixedClock {
        millis: 1_760_000_000_000,
        date: NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
    })
}

fn fast() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
    }
}

#[test]
fn sqlite_round_trips_and_keeps_users_apart() {
    let store = mem_store();
    assert_eq!(store.load("u-1").unwrap(), None);

    let mut s = Snapshot::seeded();
    s.revision = 1;
    assert_eq!(store.save("u-1", &s).unwrap(), SaveOutcome::Saved);
    assert_eq!(store.load("u-1").unwrap(), Some(s));
    assert_eq!(store.load("u-2").unwrap(), None);
}

#[test]
fn sqlite_refuses_to_go_back_in_time() {
    let store = mem_store();
    let mut newer = Snapshot::seeded();
    newer.revision = 5;
    store.save("u-1", &newer).unwrap();

    let mut older = Snapshot::default();
    older.revision = 4;
    assert_eq!(
        store.save("u-1", &older).unwrap(),
        SaveOutcome::Stale { stored_revision: 5 }
    );
    older.revision = 5;
    assert_eq!(
        store.save("u-1", &older).unwrap(),
        SaveOutcome::Stale { stored_revision: 5 }
    );
    assert_eq!(store.load("u-1").unwrap().unwrap().fixed_expenses.len(), 3);
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let mut s = Snapshot::default();
    s.revision = 3;
    SqliteSnapshotStore::open(&path).unwrap().save("u-9", &s).unwrap();
    let again = SqliteSnapshotStore::open(&path).unwrap();
    assert_eq!(again.load("u-9").unwrap().unwrap().revision, 3);
}

#[test]
fn loading_without_session_is_unauthorized() {
    let store = mem_store();
    let err = Household::load(None, &store, ledger(), TotalsConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, LedgerError::Unauthorized));
}

#[test]
fn first_load_seeds_defaults_without_saving() {
    let store = mem_store();
    let hh = Household::load(Some(&session()), &store, ledger(), TotalsConfig::default()).unwrap();
    assert!(hh.was_seeded());
    assert_eq!(hh.snapshot().fixed_expenses.len(), 3);
    assert_eq!(hh.snapshot().pending[0].amount, Decimal::from(155));
    assert_eq!(store.load("u-1").unwrap(), None);
}

#[test]
fn each_mutation_commits_a_new_revision_and_saves_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let source = SqliteSnapshotStore::open(&path).unwrap();
    let hh = Household::load(Some(&session()), &source, ledger(), TotalsConfig::default()).unwrap();
    let mut hh = hh.with_persistence(Persistence::Direct {
        store: Box::new(source),
        policy: fast(),
    });
    let id = hh
        .apply_with(|st, s| {
            st.add(
                s,
                NewRecord::PendingAdvance {
                    label: "Pharmacie".into(),
                    amount: Decimal::from(12),
                },
            )
        })
        .unwrap();
    assert_eq!(hh.snapshot().revision, 1);
    assert!(!hh.was_seeded());
    hh.apply(|st, s| st.repay(s, id, Decimal::from(12))).unwrap();
    assert_eq!(hh.snapshot().revision, 2);
    assert_eq!(hh.sync_state(), SyncState::Idle);

    let stored = SqliteSnapshotStore::open(&path).unwrap().load("u-1").unwrap().unwrap();
    assert_eq!(&stored, hh.snapshot());
}

#[test]
fn failed_mutation_leaves_state_and_revision_alone() {
    let store = mem_store();
    let mut hh = Household::load(Some(&session()), &store, ledger(), TotalsConfig::default()).unwrap();
    let before = hh.snapshot().clone();
    let err = hh.apply(|st, s| st.remove(s, Collection::Pending, 999)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(hh.snapshot(), &before);
}

#[test]
fn signing_out_locks_and_clears_the_ledger() {
    let store = mem_store();
    let mut hh = Household::load(Some(&session()), &store, ledger(), TotalsConfig::default()).unwrap();
    hh.on_session_change(None, &store).unwrap();
    let err = hh.apply(|st, s| st.absorb(s, 1)).unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized));
    assert_eq!(hh.user_id(), None);
    assert!(hh.snapshot().pending.is_empty());
}

#[test]
fn switching_users_never_carries_the_previous_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let source = SqliteSnapshotStore::open(&path).unwrap();
    let alice = session();
    let bob = Session {
        user_id: "u-2".into(),
        email: "bob@example.com".into(),
        started_at: "2025-06-02T08:00:00Z".into(),
    };

    let hh = Household::load(Some(&alice), &source, ledger(), TotalsConfig::default()).unwrap();
    let mut hh = hh.with_persistence(Persistence::Direct {
        store: Box::new(SqliteSnapshotStore::open(&path).unwrap()),
        policy: fast(),
    });
    hh.apply_with(|st, s| {
        st.add(
            s,
            NewRecord::PendingAdvance {
                label: "alice secret".into(),
                amount: Decimal::from(10),
            },
        )
    })
    .unwrap();
    let _ = hh.totals_today();

    hh.on_session_change(Some(&bob), &source).unwrap();
    assert_eq!(hh.user_id(), Some("u-2"));
    assert!(hh.was_seeded());
    assert!(hh.snapshot().pending.iter().all(|p| p.label != "alice secret"));
    assert_eq!(hh.totals_today().total_pending, Decimal::from(155));
    assert_eq!(hh.cache_hits(), 0);

    hh.apply_with(|st, s| {
        st.add(
            s,
            NewRecord::FixedExpense {
                name: "Gym".into(),
                amount: Decimal::from(30),
            },
        )
    })
    .unwrap();
    let bobs = source.load("u-2").unwrap().unwrap();
    assert!(bobs.pending.iter().all(|p| p.label != "alice secret"));
    let alices = source.load("u-1").unwrap().unwrap();
    assert!(alices.fixed_expenses.iter().all(|e| e.name != "Gym"));

    // signing back in as alice brings her ledger back
    hh.on_session_change(Some(&alice), &source).unwrap();
    assert!(hh.snapshot().pending.iter().any(|p| p.label == "alice secret"));
}

#[test]
fn totals_are_cached_between_unchanged_reads() {
    let store = mem_store();
    let mut hh = Household::load(Some(&session()), &store, ledger(), TotalsConfig::default()).unwrap();
    let a = hh.totals_today();
    let b = hh.totals_today();
    assert_eq!(a, b);
    assert_eq!(hh.cache_hits(), 1);
    assert_eq!(a.months_elapsed, 9);
}
