// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_of, id_of, patch_of, required};
use crate::app::{App, check_sync};
use crate::models::Collection;
use crate::store::{NewRecord, Patch};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let label = required(sub, "label")?.to_string();
            let amount = amount_of(sub)?;
            let comment = sub.get_one::<String>("comment").cloned().unwrap_or_default();
            let mut hh = app.household()?;
            let id = hh.apply_with(|st, s| {
                st.add(
                    s,
                    NewRecord::PersonalExpense {
                        label,
                        amount,
                        comment,
                    },
                )
            })?;
            println!("Added personal expense {}", id);
            check_sync(&hh)?;
        }
        Some(("list", sub)) => {
            let hh = app.household()?;
            let items = &hh.snapshot().personal_expenses;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), items)? {
                let rows = items
                    .iter()
                    .map(|p| {
                        vec![
                            p.id.to_string(),
                            if p.is_paid { "[x]".into() } else { "[ ]".into() },
                            p.label.clone(),
                            format!("{:.2}", p.amount),
                            p.comment.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Paid", "Label", "Amount", "Comment"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let patch = patch_of(sub, "label")?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.update(s, Collection::Personal, id, &patch))?;
            println!("Updated personal expense {}", id);
            check_sync(&hh)?;
        }
        Some(("toggle", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            let snap = hh.apply(|st, s| st.toggle_personal_paid(s, id))?;
            let paid = snap
                .personal_expenses
                .iter()
                .any(|p| p.id == id && p.is_paid);
            println!("{} marked as {}", id, if paid { "paid" } else { "unpaid" });
            check_sync(&hh)?;
        }
        Some(("comment", sub)) => {
            let id = id_of(sub)?;
            let patch = Patch {
                comment: Some(required(sub, "text")?.to_string()),
                ..Default::default()
            };
            let mut hh = app.household()?;
            hh.apply(|st, s| st.update(s, Collection::Personal, id, &patch))?;
            println!("Comment saved on {}", id);
            check_sync(&hh)?;
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, Collection::Personal, id))?;
            println!("Removed personal expense {}", id);
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}
