// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::id_of;
use crate::app::{App, check_sync};
use crate::models::{Collection, HistoryEntry, HistoryKind};
use crate::utils::{maybe_print_json, parse_id, pretty_table};
use anyhow::{Result, bail};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let hh = app.household()?;
            let entries = visible(&hh.snapshot().history, sub.get_flag("all"));
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
                let rows = entries
                    .iter()
                    .map(|h| {
                        vec![
                            h.id.to_string(),
                            h.date.format("%d %b").to_string(),
                            h.label.clone(),
                            signed(h),
                            h.kind.to_string(),
                            if h.is_archived { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Date", "Label", "Amount", "Kind", "Archived"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            let mut hh = app.household()?;
            hh.apply(|st, s| st.remove(s, Collection::History, id))?;
            println!("Removed history entry {}", id);
            check_sync(&hh)?;
        }
        Some(("archive", sub)) => {
            let mut hh = app.household()?;
            if sub.get_flag("all") {
                let n = hh.apply_with(|st, s| Ok(st.archive_all_history(s)))?;
                println!("Archived {} entries", n);
            } else if let Some(raw) = sub.get_one::<String>("id") {
                let id = parse_id(raw)?;
                hh.apply(|st, s| st.archive_history(s, id))?;
                println!("Archived history entry {}", id);
            } else {
                bail!("Pass --id <ID> or --all");
            }
            check_sync(&hh)?;
        }
        _ => {}
    }
    Ok(())
}

pub fn visible(history: &[HistoryEntry], include_archived: bool) -> Vec<HistoryEntry> {
    history
        .iter()
        .filter(|h| include_archived || !h.is_archived)
        .cloned()
        .collect()
}

fn signed(h: &HistoryEntry) -> String {
    match h.kind {
        HistoryKind::Payment => format!("-{:.2}", h.amount),
        _ => format!("+{:.2}", h.amount),
    }
}
