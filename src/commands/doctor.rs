// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::{HistoryKind, Snapshot};
use crate::utils::pretty_table;
use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::HashSet;

pub fn handle(app: &App) -> Result<()> {
    let hh = app.household()?;
    let rows = check(hh.snapshot());
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Consistency problems in a snapshot, one `[issue, detail]` row each.
pub fn check(s: &Snapshot) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    // 1) history entries whose source record is gone
    let payments: HashSet<i64> = s.exceptional_payments.iter().map(|p| p.id).collect();
    let reimbs: HashSet<i64> = s.reimbursements.iter().map(|r| r.id).collect();
    for h in &s.history {
        let Some(src) = h.source_record_id else {
            continue;
        };
        let ok = match h.kind {
            HistoryKind::Payment => payments.contains(&src),
            HistoryKind::Reimb => reimbs.contains(&src),
            HistoryKind::Other => true,
        };
        if !ok {
            rows.push(vec!["history_dangling_source".into(), format!("{} -> {}", h.id, src)]);
        }
    }

    // 2) payments and reimbursements with no history line
    let linked: HashSet<i64> = s.history.iter().filter_map(|h| h.source_record_id).collect();
    for id in payments.iter().chain(reimbs.iter()) {
        if !linked.contains(id) {
            rows.push(vec!["record_without_history".into(), id.to_string()]);
        }
    }

    // 3) zero or negative advances
    for p in &s.pending {
        if p.amount <= Decimal::ZERO {
            rows.push(vec!["non_positive_advance".into(), format!("{} {}", p.id, p.amount)]);
        }
    }
    for a in &s.savings_advances {
        if a.amount <= Decimal::ZERO {
            rows.push(vec!["non_positive_advance".into(), format!("{} {}", a.id, a.amount)]);
        }
        if !s.savings_accounts.iter().any(|acct| acct.id == a.target_account_id) {
            rows.push(vec![
                "savings_advance_missing_account".into(),
                format!("{} -> {}", a.id, a.target_account_id),
            ]);
        }
    }

    // 4) duplicate ids
    let mut seen = HashSet::new();
    let all_ids = s
        .fixed_expenses
        .iter()
        .map(|r| r.id)
        .chain(s.annual_expenses.iter().map(|r| r.id))
        .chain(s.pending.iter().map(|r| r.id))
        .chain(s.history.iter().map(|r| r.id))
        .chain(s.reimbursements.iter().map(|r| r.id))
        .chain(s.exceptional_payments.iter().map(|r| r.id))
        .chain(s.savings_accounts.iter().map(|r| r.id))
        .chain(s.savings_advances.iter().map(|r| r.id))
        .chain(s.personal_expenses.iter().map(|r| r.id));
    for id in all_ids {
        if !seen.insert(id) {
            rows.push(vec!["duplicate_id".into(), id.to_string()]);
        }
    }

    rows
}
