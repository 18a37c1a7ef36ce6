// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_of, id_of, patch_of, required};
use crate::app::{App, check_sync};
use crate::models::Collection;
use crate::store::NewRecord;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ChargeRow {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
}

/// Handles both `fixed` and `annual`; `collection` says which.
pub fn handle(app: &App, collection: Collection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?.to_string();
            let amount = amount_of(sub)?;
            let record = match collection {
                Collection::Annual => NewRecord::AnnualExpense { name, amount },
                _ => NewRecord::FixedExpense { name, amount },
            };
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| st.add(s, record))?;
            println!("Added {} {} ({})", collection, id, fmt_money(&amount));
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let rows = list_rows(hh.snapshot(), collection);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let total: Decimal = rows.iter().map(|r| r.amount).sum();
                let mut data: Vec<Vec<String>> = rows
                    .into_iter()
                    .map(|r| vec![r.id.to_string(), r.name, format!("{:.2}", r.amount)])
                    .collect();
                data.push(vec![String::new(), "Total".into(), format!("{:.2}", total)]);
                println!("{}", pretty_table(&["ID", "Name", "Amount"], data));
            }
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let patch = patch_of(sub, "name")?;
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

pub fn list_rows(s: &crate::models::Snapshot, collection: Collection) -> Vec<ChargeRow> {
    match collection {
        Collection::Annual => s
            .annual_expenses
            .iter()
            .map(|e| ChargeRow {
                id: e.id,
                name: e.name.clone(),
                amount: e.amount,
            })
            .collect(),
        _ => s
            .fixed_expenses
            .iter()
            .map(|e| ChargeRow {
                id: e.id,
                name: e.name.clone(),
                amount: e.amount,
            })
            .collect(),
    }
}
