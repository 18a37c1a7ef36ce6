// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! `savings` accounts and the `savings-advance` loans drawn on them.

use super::{amount_of, id_of, required};
use crate::app::{App, check_sync};
use crate::models::{Collection, RecordId, Snapshot};
use crate::store::{NewRecord, Patch};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_id, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;

pub fn handle_accounts(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?.to_string();
            let balance = parse_decimal(required(sub, "balance")?)?;
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| st.add(s, NewRecord::SavingsAccount { name, balance }))?;
            println!("Opened savings account {} with {}", id, fmt_money(&balance));
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let accounts = &hh.snapshot().savings_accounts;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), accounts)? {
                let rows = accounts
                    .iter()
                    .map(|a| vec![a.id.to_string(), a.name.clone(), format!("{:.2}", a.balance)])
                    .collect();
                println!("{}", pretty_table(&["ID", "Account", "Balance"], rows));
            }
        }
        Some(("adjust", sub)) => {
            let id = id_of(sub)?;
            let delta = parse_decimal(required(sub, "amount")?)?;
            let mut hh = app.household()?;
            let snap = hh.apply(|st, s| st.adjust_savings(s, id, delta))?;
            if let Some(a) = snap.savings_accounts.iter().find(|a| a.id == id) {
                println!("{} balance is now {}", a.name, fmt_money(&a.balance));
            }
            check_sync(&hh)?;
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let balance = match sub.get_one::<String>("balance") {
                Some(b) => Some(parse_decimal(b)?),
                None => None,
            };
            let patch = Patch {
                label: sub.get_one::<String>("name").cloned(),
                amount: balance,
                ..Default::default()
            };
            let mut hh = app.household()?;
            hh.apply(|st, s| st.update(s, Collection::Savings, id, &patch))?;
            println!("Updated savings account {}", id);
            check_sync(&hh)?;
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, Collection::Savings, id))?;
            println!("Closed savings account {}", id);
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_advances(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let label = required(sub, "label")?.to_string();
            let amount = amount_of(sub)?;
            let target_account_id = parse_id(required(sub, "account")?)?;
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| {
                st.add(
                    s,
                    NewRecord::SavingsAdvance {
                        label,
                        amount,
                        target_account_id,
                    },
                )
            })?;
            println!(
                "Borrowed {} from savings account {} (advance {})",
                fmt_money(&amount),
                target_account_id,
                id
            );
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let snap = hh.snapshot();
            let advances = &snap.savings_advances;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), advances)? {
                let rows = advances
                    .iter()
                    .map(|a| {
                        let account = snap
                            .savings_accounts
                            .iter()
                            .find(|s| s.id == a.target_account_id)
                            .map(|s| s.name.clone())
                            .unwrap_or_else(|| format!("#{}", a.target_account_id));
                        vec![
                            a.id.to_string(),
                            a.label.clone(),
                            account,
                            format!("{:.2}", a.amount),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Label", "Account", "Owed"], rows));
            }
        }
        Some(("repay", sub)) => {
            let id = id_of(sub)?;
            let amount = amount_of(sub)?;
            let mut hh = app.household()?;
            let credited = credited_amount(hh.snapshot(), id, amount);
            hh.apply(|st, s| st.repay_savings_advance(s, id, amount))?;
            println!("Repaid {} to savings (advance {})", fmt_money(&credited), id);
            check_sync(&hh)?;
        }
        Some(("absorb", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.absorb_savings_advance(s, id))?;
            println!("Savings advance {} absorbed", id);
            check_sync(&hh)?;
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, Collection::SavingsAdvances, id))?;
            println!("Removed savings advance {}; its amount is back on the account", id);
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}

/// What a repayment actually credits: never more than is still owed.
pub fn credited_amount(s: &Snapshot, advance_id: RecordId, requested: Decimal) -> Decimal {
    s.savings_advances
        .iter()
        .find(|a| a.id == advance_id)
        .map(|a| a.amount.min(requested))
        .unwrap_or(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SavingsAdvance;

    fn owing(amount: i64) -> Snapshot {
        let mut s = Snapshot::default();
        s.savings_advances.push(SavingsAdvance {
            id: 7,
            label: "Vacances".into(),
            amount: Decimal::from(amount),
            target_account_id: 1,
        });
        s
    }

    #[test]
    fn overpayment_is_capped_at_what_is_owed() {
        assert_eq!(credited_amount(&owing(50), 7, Decimal::from(80)), Decimal::from(50));
    }

    #[test]
    fn partial_payment_is_credited_in_full() {
        assert_eq!(credited_amount(&owing(50), 7, Decimal::from(20)), Decimal::from(20));
    }
}
