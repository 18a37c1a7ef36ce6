// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type RecordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id: RecordId,
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualExpense {
    pub id: RecordId,
    pub name: String,
    pub amount: Decimal,
}

/// An informal loan still waiting to be repaid. `amount` is the remaining balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReimbursementEntry {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionalPayment {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Payment,
    Reimb,
    Other,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Payment => write!(f, "payment"),
            HistoryKind::Reimb => write!(f, "reimb"),
            HistoryKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
    pub kind: HistoryKind,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_archived: bool,
    /// Reimbursement or exceptional payment this entry mirrors, if any.
    #[serde(default)]
    pub source_record_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsAccount {
    pub id: RecordId,
    pub name: String,
    pub balance: Decimal, // may go negative
}

/// Money taken out of a savings account that is owed back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsAdvance {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
    pub target_account_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalExpense {
    pub id: RecordId,
    pub label: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub comment: String,
}

/// The full ledger state of one household at a given revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub fixed_expenses: Vec<FixedExpense>,
    #[serde(default)]
    pub annual_expenses: Vec<AnnualExpense>,
    #[serde(default)]
    pub pending: Vec<PendingAdvance>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub reimbursements: Vec<ReimbursementEntry>,
    #[serde(default)]
    pub exceptional_payments: Vec<ExceptionalPayment>,
    #[serde(default)]
    pub savings_accounts: Vec<SavingsAccount>,
    #[serde(default)]
    pub savings_advances: Vec<SavingsAdvance>,
    #[serde(default)]
    pub personal_expenses: Vec<PersonalExpense>,
}

impl Snapshot {
    /// Default household used when nothing has been stored for a user yet.
    pub fn seeded() -> Self {
        Snapshot {
            fixed_expenses: vec![
                FixedExpense {
                    id: 1,
                    name: "Crédit Immo".into(),
                    amount: Decimal::new(1250, 0),
                },
                FixedExpense {
                    id: 2,
                    name: "Charges Copro".into(),
                    amount: Decimal::new(260, 0),
                },
                FixedExpense {
                    id: 4,
                    name: "Crèche".into(),
                    amount: Decimal::new(128183, 2),
                },
            ],
            annual_expenses: vec![
                AnnualExpense {
                    id: 101,
                    name: "Taxe Foncière".into(),
                    amount: Decimal::new(2700, 0),
                },
                AnnualExpense {
                    id: 102,
                    name: "Assurances/Divers".into(),
                    amount: Decimal::new(1848, 0),
                },
            ],
            pending: vec![PendingAdvance {
                id: 1,
                label: "Dépenses 2025".into(),
                amount: Decimal::new(155, 0),
            }],
            ..Default::default()
        }
    }

    /// Largest identifier in use across every collection.
    pub fn max_id(&self) -> RecordId {
        let ids = self
            .fixed_expenses
            .iter()
            .map(|r| r.id)
            .chain(self.annual_expenses.iter().map(|r| r.id))
            .chain(self.pending.iter().map(|r| r.id))
            .chain(self.history.iter().map(|r| r.id))
            .chain(self.reimbursements.iter().map(|r| r.id))
            .chain(self.exceptional_payments.iter().map(|r| r.id))
            .chain(self.savings_accounts.iter().map(|r| r.id))
            .chain(self.savings_advances.iter().map(|r| r.id))
            .chain(self.personal_expenses.iter().map(|r| r.id));
        ids.max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Fixed,
    Annual,
    Pending,
    Reimbursements,
    Payments,
    History,
    Savings,
    SavingsAdvances,
    Personal,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Collection::Fixed => "fixed expense",
            Collection::Annual => "annual expense",
            Collection::Pending => "pending advance",
            Collection::Reimbursements => "reimbursement",
            Collection::Payments => "exceptional payment",
            Collection::History => "history entry",
            Collection::Savings => "savings account",
            Collection::SavingsAdvances => "savings advance",
            Collection::Personal => "personal expense",
        };
        write!(f, "{}", s)
    }
}
