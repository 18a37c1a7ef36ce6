// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;

pub fn summary(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mut hh = app.household()?;
    let t = match sub.get_one::<String>("date") {
        Some(d) => hh.totals(
            NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))?,
        ),
        None => hh.totals_today(),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Transfer per person".into(), fmt_money(&t.transfer_per_person)],
        vec!["Real cash".into(), fmt_money(&t.real_cash)],
        vec!["Fixed charges".into(), fmt_money(&t.total_fixed)],
        vec!["  excluded from split".into(), fmt_money(&t.split_excluded)],
        vec!["Annual charges".into(), fmt_money(&t.total_annual)],
        vec!["Monthly provision".into(), fmt_money(&t.provision)],
        vec!["Pending advances".into(), fmt_money(&t.total_pending)],
        vec!["Reimbursed".into(), fmt_money(&t.total_reimbursed)],
        vec!["Exceptional payments".into(), fmt_money(&t.total_paid)],
        vec!["Savings".into(), fmt_money(&t.total_savings)],
        vec!["Owed to savings".into(), fmt_money(&t.total_savings_advances)],
        vec![
            "Personal (paid / total)".into(),
            format!("{} / {}", fmt_money(&t.personal_paid), fmt_money(&t.personal_total)),
        ],
    ];
    println!("{}", pretty_table(&["Figure", "Value"], rows));
    if hh.was_seeded() {
        println!("(default data: nothing saved yet for this account)");
    }
    Ok(())
}

pub fn projection(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mut hh = app.household()?;
    let t = hh.totals_today();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t.projection)? {
        let rows = t
            .projection
            .iter()
            .map(|p| vec![p.month.clone(), format!("{:.0}", p.balance)])
            .collect();
        println!("{}", pretty_table(&["Month", "Balance"], rows));
    }
    Ok(())
}
