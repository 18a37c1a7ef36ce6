// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::app::App;
use crate::config::set_setting;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let cfg = app.config()?;
            println!("{}", pretty_table(&["Key", "Value"], cfg.as_rows()));
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?.trim();
            let value = required(sub, "value")?;
            set_setting(&app.conn, key, value)?;
            println!("Set {}", key);
        }
        _ => {}
    }
    Ok(())
}
