// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived household figures. Everything here is a pure function of a
//! snapshot, a configuration and the date the figures are computed for.
//!
//! Rounding: `provision` and projection points are rounded to whole units
//! with half away from zero (150.5 -> 151, -2.5 -> -3). The per-person
//! transfer is always rounded up.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{FixedExpense, Snapshot};
use chrono::{Datelike, NaiveDate};
use regex::{Regex, RegexBuilder};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc",
];

/// Selects the fixed expense that is paid outside the shared split.
#[derive(Debug, Clone)]
pub enum SplitRule {
    /// Case-insensitive substring of the expense name.
    Substring(String),
    /// Case-insensitive regular expression over the expense name.
    Pattern(Regex),
}

impl PartialEq for SplitRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SplitRule::Substring(a), SplitRule::Substring(b)) => a == b,
            (SplitRule::Pattern(a), SplitRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Default for SplitRule {
    fn default() -> Self {
        SplitRule::substring("crèche")
    }
}

impl SplitRule {
    pub fn substring(pattern: &str) -> Self {
        SplitRule::Substring(pattern.to_lowercase())
    }

    pub fn regex(pattern: &str) -> LedgerResult<Self> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| LedgerError::Config(format!("invalid split pattern '{}': {}", pattern, e)))?;
        Ok(SplitRule::Pattern(re))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            SplitRule::Substring(p) => name.to_lowercase().contains(p.as_str()),
            SplitRule::Pattern(re) => re.is_match(name),
        }
    }

    /// Amount of the first fixed expense selected by this rule, zero if none.
    pub fn excluded_amount(&self, fixed: &[FixedExpense]) -> Decimal {
        fixed
            .iter()
            .find(|e| self.matches(&e.name))
            .map(|e| e.amount)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TotalsConfig {
    pub starting_balance: Decimal,
    pub split_rule: SplitRule,
    pub parties: u32,
    /// Add one provision per elapsed month of the year to the real cash.
    pub accrue_provision: bool,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        TotalsConfig {
            starting_balance: Decimal::new(1429, 0),
            split_rule: SplitRule::default(),
            parties: 2,
            accrue_provision: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionPoint {
    pub month: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_fixed: Decimal,
    pub total_annual: Decimal,
    pub provision: Decimal,
    pub split_excluded: Decimal,
    pub transfer_per_person: Decimal,
    pub total_pending: Decimal,
    pub total_reimbursed: Decimal,
    pub total_paid: Decimal,
    pub months_elapsed: u32,
    pub real_cash: Decimal,
    pub projection: Vec<ProjectionPoint>,
    pub total_savings: Decimal,
    pub total_savings_advances: Decimal,
    pub personal_total: Decimal,
    pub personal_paid: Decimal,
    pub personal_remaining: Decimal,
}

pub fn round_half_away(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

pub fn provision_for(total_annual: Decimal) -> Decimal {
    round_half_away(total_annual / Decimal::from(12))
}

pub fn compute(s: &Snapshot, cfg: &TotalsConfig, as_of: NaiveDate) -> Totals {
    let total_fixed: Decimal = s.fixed_expenses.iter().map(|e| e.amount).sum();
    let total_annual: Decimal = s.annual_expenses.iter().map(|e| e.amount).sum();
    let provision = provision_for(total_annual);
    let split_excluded = cfg.split_rule.excluded_amount(&s.fixed_expenses);
    let parties = Decimal::from(cfg.parties.max(1));
    let transfer_per_person = ((total_fixed - split_excluded + provision) / parties).ceil();

    let total_pending: Decimal = s.pending.iter().map(|p| p.amount).sum();
    let total_reimbursed: Decimal = s.reimbursements.iter().map(|r| r.amount).sum();
    let total_paid: Decimal = s.exceptional_payments.iter().map(|p| p.amount).sum();

    let baseline = cfg.starting_balance + total_reimbursed - total_paid - total_pending;
    let months_elapsed = as_of.month0();
    let real_cash = if cfg.accrue_provision {
        baseline + provision * Decimal::from(months_elapsed)
    } else {
        baseline
    };
    let projection = MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(i, m)| ProjectionPoint {
            month: m.to_string(),
            balance: round_half_away(baseline + provision * Decimal::from(i as u32)),
        })
        .collect();

    let personal_total: Decimal = s.personal_expenses.iter().map(|p| p.amount).sum();
    let personal_paid: Decimal = s
        .personal_expenses
        .iter()
        .filter(|p| p.is_paid)
        .map(|p| p.amount)
        .sum();

    Totals {
        total_fixed,
        total_annual,
        provision,
        split_excluded,
        transfer_per_person,
        total_pending,
        total_reimbursed,
        total_paid,
        months_elapsed,
        real_cash,
        projection,
        total_savings: s.savings_accounts.iter().map(|a| a.balance).sum(),
        total_savings_advances: s.savings_advances.iter().map(|a| a.amount).sum(),
        personal_total,
        personal_paid,
        personal_remaining: personal_total - personal_paid,
    }
}

fn same_inputs(a: &Snapshot, b: &Snapshot) -> bool {
    a.fixed_expenses == b.fixed_expenses
        && a.annual_expenses == b.annual_expenses
        && a.pending == b.pending
        && a.reimbursements == b.reimbursements
        && a.exceptional_payments == b.exceptional_payments
        && a.savings_accounts == b.savings_accounts
        && a.savings_advances == b.savings_advances
        && a.personal_expenses == b.personal_expenses
}

/// Remembers the last computation and reuses it while the inputs are equal.
#[derive(Debug, Default)]
pub struct TotalsCache {
    last: Option<(Snapshot, TotalsConfig, NaiveDate, Totals)>,
    hits: u64,
}

impl TotalsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, s: &Snapshot, cfg: &TotalsConfig, as_of: NaiveDate) -> Totals {
        if let Some((ls, lc, ld, lt)) = &self.last {
            if *ld == as_of && lc == cfg && same_inputs(ls, s) {
                self.hits += 1;
                return lt.clone();
            }
        }
        let t = compute(s, cfg, as_of);
        self.last = Some((s.clone(), cfg.clone(), as_of, t.clone()));
        t
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}
