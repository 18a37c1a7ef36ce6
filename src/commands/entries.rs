// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! `reimb` and `pay`: one-off income and expense events. Each one is also
//! written to the history log.

use super::{amount_of, id_of, patch_of, required};
use crate::app::{App, check_sync};
use crate::models::{Collection, Snapshot};
use crate::store::NewRecord;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EntryRow {
    pub id: i64,
    pub label: String,
    pub amount: Decimal,
}

pub fn handle(app: &App, collection: Collection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let label = required(sub, "label")?.to_string();
            let amount = amount_of(sub)?;
            let record = match collection {
                Collection::Reimbursements => NewRecord::Reimbursement { label, amount },
                _ => NewRecord::ExceptionalPayment { label, amount },
            };
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| st.add(s, record))?;
            println!("Recorded {} {} of {}", collection, id, fmt_money(&amount));
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let rows = rows_for(hh.snapshot(), collection);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|r| vec![r.id.to_string(), r.label, format!("{:.2}", r.amount)])
                    .collect();
                println!("{}", pretty_table(&["ID", "Label", "Amount"], data));
            }
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let patch = patch_of(sub, "label")?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.update(s, collection, id, &patch))?;
            println!("Updated {} {}", collection, id);
            check_sync(&hh)?;
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, collection, id))?;
            println!("Removed {} {}", collection, id);
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}

fn rows_for(s: &Snapshot, collection: Collection) -> Vec<EntryRow> {
    match collection {
        Collection::Reimbursements => s
            .reimbursements
            .iter()
            .map(|r| EntryRow {
                id: r.id,
                label: r.label.clone(),
                amount: r.amount,
            })
            .collect(),
        _ => s
            .exceptional_payments
            .iter()
            .map(|p| EntryRow {
                id: p.id,
                label: p.label.clone(),
                amount: p.amount,
            })
            .collect(),
    }
}
