// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::{Authenticator, LocalAuthenticator};
use crate::config::LedgerConfig;
use crate::household::{Household, Persistence};
use crate::persistence::{HttpSnapshotStore, SnapshotStore, SqliteSnapshotStore};
use crate::store::LedgerStore;
use crate::sync::{RetryPolicy, SyncState};
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Everything a command needs: the local database and where it lives.
pub struct App {
    pub conn: Connection,
    pub db_path: PathBuf,
}

impl App {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = crate::db::open_at(path)?;
        Ok(App {
            conn,
            db_path: path.to_path_buf(),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&crate::db::db_path()?)
    }

    pub fn config(&self) -> Result<LedgerConfig> {
        Ok(LedgerConfig::load(&self.conn)?)
    }

    pub fn auth(&self) -> LocalAuthenticator<'_> {
        LocalAuthenticator::new(&self.conn)
    }

    /// Remote store when a URL and key are configured, local SQLite otherwise.
    pub fn snapshot_store(&self, cfg: &LedgerConfig) -> Result<Box<dyn SnapshotStore>> {
        match (&cfg.remote_url, &cfg.remote_key) {
            (Some(url), Some(key)) => {
                log::debug!("using remote snapshot store at {}", url);
                Ok(Box::new(HttpSnapshotStore::new(url, key, &cfg.remote_table)?))
            }
            _ => Ok(Box::new(SqliteSnapshotStore::open(&self.db_path)?)),
        }
    }

    /// The signed-in user's household, saving through the configured store.
    pub fn household(&self) -> Result<Household> {
        let cfg = self.config()?;
        let session = self.auth().current_session()?;
        let source = self.snapshot_store(&cfg)?;
        let totals_cfg = cfg.totals_config()?;
        let hh = Household::load(
            session.as_ref(),
            source.as_ref(),
            LedgerStore::default(),
            totals_cfg,
        )
        .context("Open ledger")?;
        let policy = RetryPolicy {
            max_attempts: cfg.sync_attempts,
            ..Default::default()
        };
        Ok(hh.with_persistence(Persistence::Direct {
            store: source,
            policy,
        }))
    }
}

/// Turn a failed sync into a command error after the change was applied locally.
pub fn check_sync(hh: &Household) -> Result<()> {
    if let SyncState::Failed {
        revision,
        attempts,
        message,
    } = hh.flush()
    {
        bail!(
            "sync failed for revision {} after {} attempts: {}",
            revision,
            attempts,
            message
        );
    }
    Ok(())
}
