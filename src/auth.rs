// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sign-in gate in front of the ledger. Only "is there a session, and for
//! which user" matters to the rest of the crate.

use crate::error::{LedgerError, LedgerResult};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use log::info;
use rand_core::{OsRng, RngCore};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub started_at: String,
}

pub type SessionListener = Box<dyn Fn(Option<&Session>)>;

pub trait Authenticator {
    fn sign_up(&self, email: &str, password: &str) -> LedgerResult<Session>;
    fn sign_in(&self, email: &str, password: &str) -> LedgerResult<Session>;
    fn sign_out(&self) -> LedgerResult<()>;
    fn current_session(&self) -> LedgerResult<Option<Session>>;
    /// Register a callback fired after every sign-in, sign-up and sign-out.
    fn subscribe(&self, listener: SessionListener);
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> LedgerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LedgerError::Auth(format!("hash error: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> LedgerResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| LedgerError::Auth(format!("corrupt password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn new_user_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn normalize_email(email: &str) -> LedgerResult<String> {
    let e = email.trim().to_lowercase();
    match e.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(e),
        _ => Err(LedgerError::Auth(format!("invalid email '{}'", email.trim()))),
    }
}

/// Users and the active session live in the local SQLite database.
pub struct LocalAuthenticator<'a> {
    conn: &'a Connection,
    listeners: RefCell<Vec<SessionListener>>,
}

impl<'a> LocalAuthenticator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        LocalAuthenticator {
            conn,
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn notify(&self, session: Option<&Session>) {
        for l in self.listeners.borrow().iter() {
            l(session);
        }
    }

    fn start_session(&self, user_id: String, email: String) -> LedgerResult<Session> {
        let session = Session {
            user_id,
            email,
            started_at: chrono::Utc::now().to_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO session(slot, user_id, email, started_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET user_id=excluded.user_id, email=excluded.email, started_at=excluded.started_at",
            params![session.user_id, session.email, session.started_at],
        )?;
        info!("signed in as {}", session.email);
        self.notify(Some(&session));
        Ok(session)
    }
}

impl Authenticator for LocalAuthenticator<'_> {
    fn sign_up(&self, email: &str, password: &str) -> LedgerResult<Session> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LedgerError::Auth(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let exists: Option<String> = self
            .conn
            .query_row("SELECT id FROM users WHERE email=?1", params![email], |r| {
                r.get(0)
            })
            .optional()?;
        if exists.is_some() {
            return Err(LedgerError::Auth("email already registered".into()));
        }
        let id = new_user_id();
        let hash = hash_password(password)?;
        self.conn.execute(
            "INSERT INTO users(id, email, password_hash) VALUES (?1, ?2, ?3)",
            params![id, email, hash],
        )?;
        self.start_session(id, email)
    }

    fn sign_in(&self, email: &str, password: &str) -> LedgerResult<Session> {
        let invalid = || LedgerError::Auth("Invalid email or password".into());
        let email = normalize_email(email).map_err(|_| invalid())?;
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email=?1",
                params![email],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((id, hash)) = row else {
            return Err(invalid());
        };
        if !verify_password(password, &hash)? {
            return Err(invalid());
        }
        self.start_session(id, email)
    }

    fn sign_out(&self) -> LedgerResult<()> {
        self.conn.execute("DELETE FROM session", [])?;
        self.notify(None);
        Ok(())
    }

    fn current_session(&self) -> LedgerResult<Option<Session>> {
        let s = self
            .conn
            .query_row(
                "SELECT user_id, email, started_at FROM session WHERE slot=1",
                [],
                |r| {
                    Ok(Session {
                        user_id: r.get(0)?,
                        email: r.get(1)?,
                        started_at: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(s)
    }

    fn subscribe(&self, listener: SessionListener) {
        self.listeners.borrow_mut().push(listener);
    }
}
