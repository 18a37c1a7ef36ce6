// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Household settings, stored as key/value rows in the `settings` table.

use crate::error::{LedgerError, LedgerResult};
use crate::totals::{SplitRule, TotalsConfig};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub const KEYS: &[&str] = &[
    "starting_balance",
    "split_pattern",
    "split_rule_regex",
    "split_parties",
    "accrue_provision",
    "remote_url",
    "remote_key",
    "remote_table",
    "sync_attempts",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerConfig {
    pub starting_balance: Decimal,
    pub split_pattern: String,
    pub split_rule_regex: bool,
    pub split_parties: u32,
    pub accrue_provision: bool,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub remote_table: String,
    pub sync_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            starting_balance: Decimal::new(1429, 0),
            split_pattern: "crèche".to_string(),
            split_rule_regex: false,
            split_parties: 2,
            accrue_provision: true,
            remote_url: None,
            remote_key: None,
            remote_table: "ledgers".to_string(),
            sync_attempts: 3,
        }
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> LedgerResult<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> LedgerResult<()> {
    if !KEYS.contains(&key) {
        return Err(LedgerError::Config(format!("unknown setting '{}'", key)));
    }
    validate(conn, key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// The stored settings with `key` replaced must still form a usable config.
fn validate(conn: &Connection, key: &str, value: &str) -> LedgerResult<()> {
    let mut next = LedgerConfig::load(conn)?;
    next.apply(key, value)?;
    next.totals_config()?;
    Ok(())
}

fn parse_bool(key: &str, v: &str) -> LedgerResult<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LedgerError::Config(format!(
            "invalid boolean '{}' for {}",
            v, key
        ))),
    }
}

fn parse_count(key: &str, v: &str) -> LedgerResult<u32> {
    let n = v
        .trim()
        .parse::<u32>()
        .map_err(|_| LedgerError::Config(format!("invalid number '{}' for {}", v, key)))?;
    if n == 0 {
        return Err(LedgerError::Config(format!("{} must be at least 1", key)));
    }
    Ok(n)
}

impl LedgerConfig {
    /// Read every known key, falling back to defaults for absent ones.
    pub fn load(conn: &Connection) -> LedgerResult<Self> {
        let mut cfg = LedgerConfig::default();
        for key in KEYS {
            if let Some(v) = get_setting(conn, key)? {
                cfg.apply(key, &v)?;
            }
        }
        Ok(cfg)
    }

    fn apply(&mut self, key: &str, v: &str) -> LedgerResult<()> {
        match key {
            "starting_balance" => {
                let d = v.trim().parse::<Decimal>().map_err(|_| {
                    LedgerError::Config(format!("invalid decimal '{}' for starting_balance", v))
                })?;
                self.starting_balance = crate::store::within_limit(d)
                    .map_err(|e| LedgerError::Config(format!("starting_balance: {}", e)))?;
            }
            "split_pattern" => self.split_pattern = v.to_string(),
            "split_rule_regex" => self.split_rule_regex = parse_bool(key, v)?,
            "split_parties" => self.split_parties = parse_count(key, v)?,
            "accrue_provision" => self.accrue_provision = parse_bool(key, v)?,
            "remote_url" => {
                self.remote_url = Some(v.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
            }
            "remote_key" => self.remote_key = Some(v.trim().to_string()).filter(|s| !s.is_empty()),
            "remote_table" => self.remote_table = v.trim().to_string(),
            "sync_attempts" => self.sync_attempts = parse_count(key, v)?,
            _ => {}
        }
        Ok(())
    }

    pub fn split_rule(&self) -> LedgerResult<SplitRule> {
        if self.split_rule_regex {
            SplitRule::regex(&self.split_pattern)
        } else {
            Ok(SplitRule::substring(&self.split_pattern))
        }
    }

    pub fn totals_config(&self) -> LedgerResult<TotalsConfig> {
        Ok(TotalsConfig {
            starting_balance: self.starting_balance,
            split_rule: self.split_rule()?,
            parties: self.split_parties,
            accrue_provision: self.accrue_provision,
        })
    }

    pub fn as_rows(&self) -> Vec<Vec<String>> {
        vec![
            vec!["starting_balance".into(), self.starting_balance.to_string()],
            vec!["split_pattern".into(), self.split_pattern.clone()],
            vec!["split_rule_regex".into(), self.split_rule_regex.to_string()],
            vec!["split_parties".into(), self.split_parties.to_string()],
            vec!["accrue_provision".into(), self.accrue_provision.to_string()],
            vec![
                "remote_url".into(),
                self.remote_url.clone().unwrap_or_default(),
            ],
            vec![
                "remote_key".into(),
                if self.remote_key.is_some() { "********".into() } else { String::new() },
            ],
            vec!["remote_table".into(), self.remote_table.clone()],
            vec!["sync_attempts".into(), self.sync_attempts.to_string()],
        ]
    }
}
