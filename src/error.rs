// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types shared by the ledger store, totals engine and collaborators.

use crate::models::{Collection, RecordId};
use thiserror::Error;

/// Rejected user input. Nothing is applied when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be strictly positive")]
    NonPositiveAmount,
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("balance adjustment must not be zero")]
    ZeroAdjustment,
    #[error("amount exceeds the limit of {0}")]
    AmountTooLarge(rust_decimal::Decimal),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{collection} {id} not found")]
    NotFound {
        collection: Collection,
        id: RecordId,
    },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("no active session; sign in first")]
    Unauthorized,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn not_found(collection: Collection, id: RecordId) -> Self {
        LedgerError::NotFound { collection, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Persistence(e.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        LedgerError::Persistence(e.to_string())
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
