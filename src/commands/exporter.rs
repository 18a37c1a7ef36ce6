// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::app::App;
use crate::models::Snapshot;
use anyhow::{Context, Result};
use std::path::Path;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("snapshot", sub)) => {
            let out = required(sub, "out")?;
            let hh = app.household()?;
            write_snapshot(hh.snapshot(), Path::new(out))?;
            println!("Exported ledger to {}", out);
        }
        Some(("history", sub)) => {
            let out = required(sub, "out")?;
            let fmt = sub
                .get_one::<String>("format")
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| "csv".into());
            let hh = app.household()?;
            write_history(hh.snapshot(), &fmt, Path::new(out))?;
            println!("Exported history to {}", out);
        }
        _ => {}
    }
    Ok(())
}

pub fn write_snapshot(s: &Snapshot, out: &Path) -> Result<()> {
    std::fs::write(out, serde_json::to_string_pretty(s)?)
        .with_context(|| format!("Write {}", out.display()))
}

pub fn write_history(s: &Snapshot, fmt: &str, out: &Path) -> Result<()> {
    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "label", "amount", "kind", "archived", "source"])?;
            for h in &s.history {
                wtr.write_record([
                    h.id.to_string(),
                    h.date.to_string(),
                    h.label.clone(),
                    h.amount.to_string(),
                    h.kind.to_string(),
                    h.is_archived.to_string(),
                    h.source_record_id.map(|v| v.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&s.history)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
        other => anyhow::bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(())
}
