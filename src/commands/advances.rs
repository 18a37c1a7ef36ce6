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

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let label = required(sub, "label")?.to_string();
            let amount = amount_of(sub)?;
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| st.add(s, NewRecord::PendingAdvance { label, amount }))?;
            println!("Recorded advance {} of {}", id, fmt_money(&amount));
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let pending = &hh.snapshot().pending;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), pending)? {
                if pending.is_empty() {
                    println!("All advances are settled.");
                } else {
                    let rows = pending
                        .iter()
                        .map(|p| vec![p.id.to_string(), p.label.clone(), format!("{:.2}", p.amount)])
                        .collect();
                    println!("{}", pretty_table(&["ID", "Label", "Remaining"], rows));
                }
            }
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let patch = patch_of(sub, "label")?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.update(s, Collection::Pending, id, &patch))?;
            println!("Updated advance {}", id);
            check_sync(&hh)?;
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, Collection::Pending, id))?;
            println!("Removed advance {}", id);
            check_sync(&hh)?;
        }
        Some(("repay", sub)) => {
            let id = id_of(sub)?;
            let amount = amount_of(sub)?;
            let mut hh = app.household()?;
            let snap = hh.apply(|st, s| st.repay(s, id, amount))?;
            match snap.pending.iter().find(|p| p.id == id) {
                Some(p) => println!(
                    "Partial repayment of {}; {} still owed",
                    fmt_money(&amount),
                    fmt_money(&p.amount)
                ),
                None => println!("Advance {} fully repaid", id),
            }
            check_sync(&hh)?;
        }
        Some(("absorb", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.absorb(s, id))?;
            println!("Advance {} absorbed as an exceptional payment", id);
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}
