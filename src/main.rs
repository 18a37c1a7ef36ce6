// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use nexus_ledger::app::App;
use nexus_ledger::models::Collection;
use nexus_ledger::{cli, commands, db};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let app = App::open_default()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("auth", sub)) => commands::auth::handle(&app, sub)?,
        Some(("fixed", sub)) => commands::expenses::handle(&app, Collection::Fixed, sub)?,
        Some(("annual", sub)) => commands::expenses::handle(&app, Collection::Annual, sub)?,
        Some(("advance", sub)) => commands::advances::handle(&app, sub)?,
        Some(("reimb", sub)) => commands::entries::handle(&app, Collection::Reimbursements, sub)?,
        Some(("pay", sub)) => commands::entries::handle(&app, Collection::Payments, sub)?,
        Some(("history", sub)) => commands::history::handle(&app, sub)?,
        Some(("savings", sub)) => commands::savings::handle_accounts(&app, sub)?,
        Some(("savings-advance", sub)) => commands::savings::handle_advances(&app, sub)?,
        Some(("personal", sub)) => commands::personal::handle(&app, sub)?,
        Some(("summary", sub)) => commands::summary::summary(&app, sub)?,
        Some(("projection", sub)) => commands::summary::projection(&app, sub)?,
        Some(("config", sub)) => commands::settings::handle(&app, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&app, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&app)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
