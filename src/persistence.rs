// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Snapshot persistence. A save always replaces the user's whole snapshot,
//! and a store never lets an older revision overwrite a newer one.

use crate::error::{LedgerError, LedgerResult};
use crate::models::Snapshot;
use crate::utils::http_client;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The store already holds this revision or a newer one.
    Stale { stored_revision: u64 },
}

pub trait SnapshotStore: Send + Sync {
    fn load(&self, user_id: &str) -> LedgerResult<Option<Snapshot>>;
    fn save(&self, user_id: &str, snapshot: &Snapshot) -> LedgerResult<SaveOutcome>;
}

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn new(conn: Connection) -> LedgerResult<Self> {
        crate::db::init_schema(&conn).map_err(|e| LedgerError::Persistence(e.to_string()))?;
        Ok(SqliteSnapshotStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: &Path) -> LedgerResult<Self> {
        Self::new(Connection::open(path)?)
    }

    fn conn(&self) -> LedgerResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Persistence("snapshot store lock poisoned".into()))
    }

    fn stored_revision(conn: &Connection, user_id: &str) -> LedgerResult<Option<u64>> {
        let r: Option<i64> = conn
            .query_row(
                "SELECT revision FROM snapshots WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(r.map(|v| v as u64))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self, user_id: &str) -> LedgerResult<Option<Snapshot>> {
        let conn = self.conn()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT revision, payload FROM snapshots WHERE user_id=?1",
                params![user_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        match row {
            Some((rev, payload)) => {
                let mut s: Snapshot = serde_json::from_str(&payload)?;
                s.revision = rev as u64;
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> LedgerResult<SaveOutcome> {
        let conn = self.conn()?;
        let payload = serde_json::to_string(snapshot)?;
        let changed = conn.execute(
            "INSERT INTO snapshots(user_id, revision, payload, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET
                revision=excluded.revision,
                payload=excluded.payload,
                updated_at=excluded.updated_at
             WHERE excluded.revision > snapshots.revision",
            params![user_id, snapshot.revision as i64, payload],
        )?;
        if changed == 0 {
            let stored_revision = Self::stored_revision(&conn, user_id)?.unwrap_or(0);
            return Ok(SaveOutcome::Stale { stored_revision });
        }
        Ok(SaveOutcome::Saved)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RemoteRow {
    user_id: String,
    revision: u64,
    payload: Snapshot,
}

#[derive(Debug, Deserialize)]
struct RemoteRevision {
    revision: u64,
}

/// Snapshot store backed by a hosted PostgREST endpoint
/// (`{base}/rest/v1/{table}` with columns `user_id`, `revision`, `payload`).
pub struct HttpSnapshotStore {
    base_url: String,
    api_key: String,
    table: String,
    client: reqwest::blocking::Client,
}

impl HttpSnapshotStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> LedgerResult<Self> {
        let client = http_client().map_err(|e| LedgerError::Persistence(e.to_string()))?;
        Ok(HttpSnapshotStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            client,
        })
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    pub fn row_url(&self, user_id: &str, select: &str) -> String {
        format!(
            "{}?user_id=eq.{}&select={}",
            self.table_url(),
            user_id,
            select
        )
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn remote_revision(&self, user_id: &str) -> LedgerResult<Option<u64>> {
        let rows: Vec<RemoteRevision> = self
            .get(&self.row_url(user_id, "revision"))
            .send()?
            .error_for_status()?
            .json()?;
        Ok(rows.first().map(|r| r.revision))
    }
}

impl SnapshotStore for HttpSnapshotStore {
    fn load(&self, user_id: &str) -> LedgerResult<Option<Snapshot>> {
        let rows: Vec<RemoteRow> = self
            .get(&self.row_url(user_id, "user_id,revision,payload"))
            .send()?
            .error_for_status()?
            .json()?;
        Ok(rows.into_iter().next().map(|r| {
            let mut s = r.payload;
            s.revision = r.revision;
            s
        }))
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> LedgerResult<SaveOutcome> {
        if let Some(stored) = self.remote_revision(user_id)? {
            if stored >= snapshot.revision {
                return Ok(SaveOutcome::Stale {
                    stored_revision: stored,
                });
            }
        }
        let row = RemoteRow {
            user_id: user_id.to_string(),
            revision: snapshot.revision,
            payload: snapshot.clone(),
        };
        self.client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()?
            .error_for_status()?;
        Ok(SaveOutcome::Saved)
    }
}
