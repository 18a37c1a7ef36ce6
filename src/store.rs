// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: every mutation takes the current snapshot and returns a new
//! one. The input snapshot is never modified, so a failed operation leaves
//! the caller's state untouched.

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::models::*;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock pinned to a fixed instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub millis: i64,
    pub date: NaiveDate,
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}

pub trait Identified {
    fn id(&self) -> RecordId;
}

macro_rules! identified {
    ($($t:ty),*) => {
        $(impl Identified for $t {
            fn id(&self) -> RecordId {
                self.id
            }
        })*
    };
}

identified!(
    FixedExpense,
    AnnualExpense,
    PendingAdvance,
    ReimbursementEntry,
    ExceptionalPayment,
    HistoryEntry,
    SavingsAccount,
    SavingsAdvance,
    PersonalExpense
);

fn index_of<T: Identified>(items: &[T], id: RecordId) -> Option<usize> {
    items.iter().position(|r| r.id() == id)
}

fn remove_by_id<T: Identified>(
    items: &mut Vec<T>,
    collection: Collection,
    id: RecordId,
) -> LedgerResult<T> {
    let idx = index_of(items, id).ok_or_else(|| LedgerError::not_found(collection, id))?;
    Ok(items.remove(idx))
}

/// Largest magnitude accepted for any amount, balance or adjustment.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

pub fn within_limit(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.abs() > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge(MAX_AMOUNT));
    }
    Ok(amount)
}

pub fn positive(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    within_limit(amount)
}

pub fn non_empty(label: &str) -> Result<String, ValidationError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    Ok(trimmed.to_string())
}

/// Parse a user-typed amount and require it to be strictly positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let d = raw
        .trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidAmount(raw.trim().to_string()))?;
    positive(d)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewRecord {
    FixedExpense {
        name: String,
        amount: Decimal,
    },
    AnnualExpense {
        name: String,
        amount: Decimal,
    },
    PendingAdvance {
        label: String,
        amount: Decimal,
    },
    Reimbursement {
        label: String,
        amount: Decimal,
    },
    ExceptionalPayment {
        label: String,
        amount: Decimal,
    },
    SavingsAccount {
        name: String,
        balance: Decimal,
    },
    SavingsAdvance {
        label: String,
        amount: Decimal,
        target_account_id: RecordId,
    },
    PersonalExpense {
        label: String,
        amount: Decimal,
        comment: String,
    },
}

impl NewRecord {
    pub fn collection(&self) -> Collection {
        match self {
            NewRecord::FixedExpense { .. } => Collection::Fixed,
            NewRecord::AnnualExpense { .. } => Collection::Annual,
            NewRecord::PendingAdvance { .. } => Collection::Pending,
            NewRecord::Reimbursement { .. } => Collection::Reimbursements,
            NewRecord::ExceptionalPayment { .. } => Collection::Payments,
            NewRecord::SavingsAccount { .. } => Collection::Savings,
            NewRecord::SavingsAdvance { .. } => Collection::SavingsAdvances,
            NewRecord::PersonalExpense { .. } => Collection::Personal,
        }
    }
}

/// Fields to overwrite on an existing record. `None` keeps the current value.
/// For savings accounts `amount` sets the balance, which may be any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub label: Option<String>,
    pub amount: Option<Decimal>,
    pub comment: Option<String>,
    pub is_paid: Option<bool>,
}

impl Patch {
    pub fn label(label: impl Into<String>) -> Self {
        Patch {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn amount(amount: Decimal) -> Self {
        Patch {
            amount: Some(amount),
            ..Default::default()
        }
    }

    fn checked_label(&self) -> Result<Option<String>, ValidationError> {
        self.label.as_deref().map(non_empty).transpose()
    }

    fn checked_amount(&self) -> Result<Option<Decimal>, ValidationError> {
        self.amount.map(positive).transpose()
    }
}

pub struct LedgerStore<C: Clock = SystemClock> {
    clock: C,
}

impl Default for LedgerStore<SystemClock> {
    fn default() -> Self {
        LedgerStore { clock: SystemClock }
    }
}

impl<C: Clock> LedgerStore<C> {
    pub fn with_clock(clock: C) -> Self {
        LedgerStore { clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn fresh_id(&self, s: &Snapshot) -> RecordId {
        let candidate = self.clock.now_millis();
        let max = s.max_id();
        if candidate <= max { max + 1 } else { candidate }
    }

    fn log_history(
        &self,
        s: &mut Snapshot,
        label: String,
        amount: Decimal,
        kind: HistoryKind,
        source_record_id: Option<RecordId>,
    ) -> RecordId {
        let id = self.fresh_id(s);
        s.history.insert(
            0,
            HistoryEntry {
                id,
                label,
                amount,
                kind,
                date: self.clock.today(),
                is_archived: false,
                source_record_id,
            },
        );
        id
    }

    /// Insert a record at the head of its collection and return its new id.
    pub fn add(&self, snapshot: &Snapshot, record: NewRecord) -> LedgerResult<(Snapshot, RecordId)> {
        let mut s = snapshot.clone();
        let id = self.fresh_id(&s);
        match record {
            NewRecord::FixedExpense { name, amount } => {
                s.fixed_expenses.insert(
                    0,
                    FixedExpense {
                        id,
                        name: non_empty(&name)?,
                        amount: positive(amount)?,
                    },
                );
            }
            NewRecord::AnnualExpense { name, amount } => {
                s.annual_expenses.insert(
                    0,
                    AnnualExpense {
                        id,
                        name: non_empty(&name)?,
                        amount: positive(amount)?,
                    },
                );
            }
            NewRecord::PendingAdvance { label, amount } => {
                s.pending.insert(
                    0,
                    PendingAdvance {
                        id,
                        label: non_empty(&label)?,
                        amount: positive(amount)?,
                    },
                );
            }
            NewRecord::Reimbursement { label, amount } => {
                let label = non_empty(&label)?;
                let amount = positive(amount)?;
                s.reimbursements.insert(
                    0,
                    ReimbursementEntry {
                        id,
                        label: label.clone(),
                        amount,
                    },
                );
                self.log_history(&mut s, label, amount, HistoryKind::Reimb, Some(id));
            }
            NewRecord::ExceptionalPayment { label, amount } => {
                let label = non_empty(&label)?;
                let amount = positive(amount)?;
                s.exceptional_payments.insert(
                    0,
                    ExceptionalPayment {
                        id,
                        label: label.clone(),
                        amount,
                    },
                );
                self.log_history(&mut s, label, amount, HistoryKind::Payment, Some(id));
            }
            NewRecord::SavingsAccount { name, balance } => {
                s.savings_accounts.insert(
                    0,
                    SavingsAccount {
                        id,
                        name: non_empty(&name)?,
                        balance: within_limit(balance)?,
                    },
                );
            }
            NewRecord::SavingsAdvance {
                label,
                amount,
                target_account_id,
            } => {
                let label = non_empty(&label)?;
                let amount = positive(amount)?;
                let idx = index_of(&s.savings_accounts, target_account_id).ok_or_else(|| {
                    LedgerError::not_found(Collection::Savings, target_account_id)
                })?;
                s.savings_accounts[idx].balance -= amount;
                s.savings_advances.insert(
                    0,
                    SavingsAdvance {
                        id,
                        label,
                        amount,
                        target_account_id,
                    },
                );
            }
            NewRecord::PersonalExpense {
                label,
                amount,
                comment,
            } => {
                s.personal_expenses.insert(
                    0,
                    PersonalExpense {
                        id,
                        label: non_empty(&label)?,
                        amount: positive(amount)?,
                        is_paid: false,
                        comment: comment.trim().to_string(),
                    },
                );
            }
        }
        Ok((s, id))
    }

    /// Overwrite the patched fields of one record. Edits to a reimbursement or
    /// payment are mirrored onto its history entry and vice versa.
    pub fn update(
        &self,
        snapshot: &Snapshot,
        collection: Collection,
        id: RecordId,
        patch: &Patch,
    ) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        let missing = || LedgerError::not_found(collection, id);
        match collection {
            Collection::Fixed => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.fixed_expenses.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.name = l;
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
            }
            Collection::Annual => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.annual_expenses.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.name = l;
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
            }
            Collection::Pending => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.pending.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.label = l;
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
            }
            Collection::Reimbursements => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.reimbursements.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = &label {
                    r.label = l.clone();
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
                mirror_onto_history(&mut s.history, id, label, amount);
            }
            Collection::Payments => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s
                    .exceptional_payments
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(missing)?;
                if let Some(l) = &label {
                    r.label = l.clone();
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
                mirror_onto_history(&mut s.history, id, label, amount);
            }
            Collection::History => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let h = s.history.iter_mut().find(|h| h.id == id).ok_or_else(missing)?;
                if let Some(l) = &label {
                    h.label = l.clone();
                }
                if let Some(a) = amount {
                    h.amount = a;
                }
                let (kind, source) = (h.kind, h.source_record_id);
                if let Some(src) = source {
                    match kind {
                        HistoryKind::Payment => {
                            if let Some(p) = s.exceptional_payments.iter_mut().find(|p| p.id == src) {
                                if let Some(l) = label {
                                    p.label = l;
                                }
                                if let Some(a) = amount {
                                    p.amount = a;
                                }
                            }
                        }
                        HistoryKind::Reimb => {
                            if let Some(r) = s.reimbursements.iter_mut().find(|r| r.id == src) {
                                if let Some(l) = label {
                                    r.label = l;
                                }
                                if let Some(a) = amount {
                                    r.amount = a;
                                }
                            }
                        }
                        HistoryKind::Other => {}
                    }
                }
            }
            Collection::Savings => {
                let label = patch.checked_label()?;
                let balance = patch.amount.map(within_limit).transpose()?;
                let r = s.savings_accounts.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.name = l;
                }
                if let Some(b) = balance {
                    r.balance = b;
                }
            }
            Collection::SavingsAdvances => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.savings_advances.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.label = l;
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
            }
            Collection::Personal => {
                let label = patch.checked_label()?;
                let amount = patch.checked_amount()?;
                let r = s.personal_expenses.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
                if let Some(l) = label {
                    r.label = l;
                }
                if let Some(a) = amount {
                    r.amount = a;
                }
                if let Some(c) = &patch.comment {
                    r.comment = c.trim().to_string();
                }
                if let Some(p) = patch.is_paid {
                    r.is_paid = p;
                }
            }
        }
        Ok(s)
    }

    /// Delete one record. Reimbursements and payments take their history entry
    /// with them, and deleting a linked history entry deletes its source.
    /// Deleting a savings advance returns its outstanding amount to the account.
    pub fn remove(
        &self,
        snapshot: &Snapshot,
        collection: Collection,
        id: RecordId,
    ) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        match collection {
            Collection::Fixed => {
                remove_by_id(&mut s.fixed_expenses, collection, id)?;
            }
            Collection::Annual => {
                remove_by_id(&mut s.annual_expenses, collection, id)?;
            }
            Collection::Pending => {
                remove_by_id(&mut s.pending, collection, id)?;
            }
            Collection::Reimbursements => {
                remove_by_id(&mut s.reimbursements, collection, id)?;
                s.history.retain(|h| h.source_record_id != Some(id));
            }
            Collection::Payments => {
                remove_by_id(&mut s.exceptional_payments, collection, id)?;
                s.history.retain(|h| h.source_record_id != Some(id));
            }
            Collection::History => {
                let entry = remove_by_id(&mut s.history, collection, id)?;
                if let Some(src) = entry.source_record_id {
                    match entry.kind {
                        HistoryKind::Payment => s.exceptional_payments.retain(|p| p.id != src),
                        HistoryKind::Reimb => s.reimbursements.retain(|r| r.id != src),
                        HistoryKind::Other => {}
                    }
                    debug!("history {} removed with its {} source {}", id, entry.kind, src);
                }
            }
            Collection::Savings => {
                if s.savings_advances.iter().any(|a| a.target_account_id == id) {
                    return Err(LedgerError::Conflict(format!(
                        "savings account {} still has outstanding advances",
                        id
                    )));
                }
                remove_by_id(&mut s.savings_accounts, collection, id)?;
            }
            Collection::SavingsAdvances => {
                // undo the debit made when the advance was recorded
                let adv = remove_by_id(&mut s.savings_advances, collection, id)?;
                if let Some(acct) = s
                    .savings_accounts
                    .iter_mut()
                    .find(|a| a.id == adv.target_account_id)
                {
                    acct.balance += adv.amount;
                }
            }
            Collection::Personal => {
                remove_by_id(&mut s.personal_expenses, collection, id)?;
            }
        }
        Ok(s)
    }

    /// Record a repayment against a pending advance. Paying at least the
    /// remaining balance settles the advance; anything less reduces it.
    pub fn repay(&self, snapshot: &Snapshot, advance_id: RecordId, amount: Decimal) -> LedgerResult<Snapshot> {
        let amount = positive(amount)?;
        let mut s = snapshot.clone();
        let idx = index_of(&s.pending, advance_id)
            .ok_or_else(|| LedgerError::not_found(Collection::Pending, advance_id))?;
        if amount >= s.pending[idx].amount {
            let adv = s.pending.remove(idx);
            debug!("advance {} settled ({})", adv.id, adv.amount);
            self.log_history(
                &mut s,
                format!("Remboursé: {}", adv.label),
                adv.amount,
                HistoryKind::Reimb,
                None,
            );
        } else {
            s.pending[idx].amount -= amount;
            let label = format!("Partiel: {}", s.pending[idx].label);
            self.log_history(&mut s, label, amount, HistoryKind::Reimb, None);
        }
        Ok(s)
    }

    /// Turn a pending advance into an exceptional payment of its full amount.
    pub fn absorb(&self, snapshot: &Snapshot, advance_id: RecordId) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        let adv = remove_by_id(&mut s.pending, Collection::Pending, advance_id)?;
        let label = format!("Absorbé: {}", adv.label);
        let payment_id = self.fresh_id(&s);
        s.exceptional_payments.insert(
            0,
            ExceptionalPayment {
                id: payment_id,
                label: label.clone(),
                amount: adv.amount,
            },
        );
        self.log_history(&mut s, label, adv.amount, HistoryKind::Payment, Some(payment_id));
        Ok(s)
    }

    /// Repay money borrowed from a savings account, crediting the account.
    pub fn repay_savings_advance(
        &self,
        snapshot: &Snapshot,
        advance_id: RecordId,
        amount: Decimal,
    ) -> LedgerResult<Snapshot> {
        let amount = positive(amount)?;
        let mut s = snapshot.clone();
        let idx = index_of(&s.savings_advances, advance_id)
            .ok_or_else(|| LedgerError::not_found(Collection::SavingsAdvances, advance_id))?;
        let target = s.savings_advances[idx].target_account_id;
        let acct = index_of(&s.savings_accounts, target)
            .ok_or_else(|| LedgerError::not_found(Collection::Savings, target))?;
        if amount >= s.savings_advances[idx].amount {
            let adv = s.savings_advances.remove(idx);
            s.savings_accounts[acct].balance += adv.amount;
            self.log_history(
                &mut s,
                format!("Remboursé épargne: {}", adv.label),
                adv.amount,
                HistoryKind::Other,
                None,
            );
        } else {
            s.savings_advances[idx].amount -= amount;
            s.savings_accounts[acct].balance += amount;
            let label = format!("Partiel épargne: {}", s.savings_advances[idx].label);
            self.log_history(&mut s, label, amount, HistoryKind::Other, None);
        }
        Ok(s)
    }

    /// Forgive money borrowed from savings. The account is not credited.
    pub fn absorb_savings_advance(&self, snapshot: &Snapshot, advance_id: RecordId) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        let adv = remove_by_id(&mut s.savings_advances, Collection::SavingsAdvances, advance_id)?;
        self.log_history(
            &mut s,
            format!("Absorbé épargne: {}", adv.label),
            adv.amount,
            HistoryKind::Other,
            None,
        );
        Ok(s)
    }

    /// Signed deposit (positive) or withdrawal (negative) on a savings account.
    pub fn adjust_savings(&self, snapshot: &Snapshot, account_id: RecordId, delta: Decimal) -> LedgerResult<Snapshot> {
        if delta.is_zero() {
            return Err(ValidationError::ZeroAdjustment.into());
        }
        let delta = within_limit(delta)?;
        let mut s = snapshot.clone();
        let acct = s
            .savings_accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| LedgerError::not_found(Collection::Savings, account_id))?;
        acct.balance = within_limit(acct.balance + delta)?;
        Ok(s)
    }

    pub fn archive_history(&self, snapshot: &Snapshot, id: RecordId) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        let h = s
            .history
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| LedgerError::not_found(Collection::History, id))?;
        h.is_archived = true;
        Ok(s)
    }

    /// Archive every visible history entry; returns how many were archived.
    pub fn archive_all_history(&self, snapshot: &Snapshot) -> (Snapshot, usize) {
        let mut s = snapshot.clone();
        let mut n = 0;
        for h in s.history.iter_mut().filter(|h| !h.is_archived) {
            h.is_archived = true;
            n += 1;
        }
        (s, n)
    }

    pub fn toggle_personal_paid(&self, snapshot: &Snapshot, id: RecordId) -> LedgerResult<Snapshot> {
        let mut s = snapshot.clone();
        let p = s
            .personal_expenses
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LedgerError::not_found(Collection::Personal, id))?;
        p.is_paid = !p.is_paid;
        Ok(s)
    }
}

fn mirror_onto_history(
    history: &mut [HistoryEntry],
    source: RecordId,
    label: Option<String>,
    amount: Option<Decimal>,
) {
    for h in history.iter_mut().filter(|h| h.source_record_id == Some(source)) {
        if let Some(l) = &label {
            h.label = l.clone();
        }
        if let Some(a) = amount {
            h.amount = a;
        }
    }
}
