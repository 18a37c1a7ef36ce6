// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use nexus_ledger::app::App;
use nexus_ledger::models::Collection;
use nexus_ledger::{cli, commands};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn setup() -> (TempDir, App) {
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(&dir.path().join("nexus.sqlite")).unwrap();
    run(&app, &["auth", "signup", "--email", "a@b.fr", "--password", "secret1"]).unwrap();
    (dir, app)
}

fn run(app: &App, args: &[&str]) -> Result<()> {
    let mut argv = vec!["nexus"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    match matches.subcommand() {
        Some(("auth", sub)) => commands::auth::handle(app, sub),
        Some(("fixed", sub)) => commands::expenses::handle(app, Collection::Fixed, sub),
        Some(("annual", sub)) => commands::expenses::handle(app, Collection::Annual, sub),
        Some(("advance", sub)) => commands::advances::handle(app, sub),
        Some(("reimb", sub)) => commands::entries::handle(app, Collection::Reimbursements, sub),
        Some(("pay", sub)) => commands::entries::handle(app, Collection::Payments, sub),
        Some(("history", sub)) => commands::history::handle(app, sub),
        Some(("savings", sub)) => commands::savings::handle_accounts(app, sub),
        Some(("savings-advance", sub)) => commands::savings::handle_advances(app, sub),
        Some(("personal", sub)) => commands::personal::handle(app, sub),
        Some(("summary", sub)) => commands::summary::summary(app, sub),
        Some(("projection", sub)) => commands::summary::projection(app, sub),
        Some(("config", sub)) => commands::settings::handle(app, sub),
        Some(("export", sub)) => commands::exporter::handle(app, sub),
        Some(("doctor", _)) => commands::doctor::handle(app),
        _ => Ok(()),
    }
}

#[test]
fn commands_require_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(&dir.path().join("nexus.sqlite")).unwrap();
    let err = run(&app, &["fixed", "list"]).unwrap_err();
    assert!(format!("{:#}", err).contains("sign in"));
}

#[test]
fn first_mutation_persists_seed_plus_change() {
    let (_dir, app) = setup();
    run(&app, &["fixed", "add", "--name", "Internet", "--amount", "29,99"]).unwrap();
    let hh = app.household().unwrap();
    assert!(!hh.was_seeded());
    assert_eq!(hh.snapshot().revision, 1);
    let names: Vec<&str> = hh.snapshot().fixed_expenses.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names[0], "Internet");
    assert_eq!(names.len(), 4);
    assert_eq!(hh.snapshot().fixed_expenses[0].amount, Decimal::new(2999, 2));
}

#[test]
fn invalid_amounts_are_rejected_before_saving() {
    let (_dir, app) = setup();
    assert!(run(&app, &["annual", "add", "--name", "Taxe", "--amount", "0"]).is_err());
    assert!(run(&app, &["annual", "add", "--name", "Taxe", "--amount", "abc"]).is_err());
    assert!(app.household().unwrap().was_seeded());
}

#[test]
fn advance_lifecycle() {
    let (_dir, app) = setup();
    run(&app, &["advance", "add", "--label", "Courses", "--amount", "60"]).unwrap();
    let id = app.household().unwrap().snapshot().pending[0].id.to_string();
    run(&app, &["advance", "repay", "--id", &id, "--amount", "20"]).unwrap();
    {
        let hh = app.household().unwrap();
        let adv = hh.snapshot().pending.iter().find(|p| p.id.to_string() == id).unwrap();
        assert_eq!(adv.amount, Decimal::from(40));
        assert_eq!(hh.snapshot().history[0].label, "Partiel: Courses");
    }
    run(&app, &["advance", "absorb", "--id", &id]).unwrap();
    let hh = app.household().unwrap();
    assert!(hh.snapshot().pending.iter().all(|p| p.id.to_string() != id));
    assert_eq!(hh.snapshot().exceptional_payments[0].label, "Absorbé: Courses");
    assert_eq!(hh.snapshot().revision, 3);
}

#[test]
fn history_delete_cascades_to_the_payment() {
    let (_dir, app) = setup();
    run(&app, &["pay", "add", "--label", "Garagiste", "--amount", "210"]).unwrap();
    let h = app.household().unwrap().snapshot().history[0].id.to_string();
    run(&app, &["history", "rm", "--id", &h]).unwrap();
    let hh = app.household().unwrap();
    assert!(hh.snapshot().history.is_empty());
    assert!(hh.snapshot().exceptional_payments.is_empty());
}

#[test]
fn history_archive_all() {
    let (_dir, app) = setup();
    run(&app, &["reimb", "add", "--label", "CAF", "--amount", "100"]).unwrap();
    run(&app, &["pay", "add", "--label", "Plombier", "--amount", "80"]).unwrap();
    run(&app, &["history", "archive", "--all"]).unwrap();
    let hh = app.household().unwrap();
    assert!(hh.snapshot().history.iter().all(|h| h.is_archived));
    assert_eq!(hh.snapshot().reimbursements.len(), 1);
}

#[test]
fn savings_flow() {
    let (_dir, app) = setup();
    run(&app, &["savings", "add", "--name", "Livret A", "--balance", "1000"]).unwrap();
    let acct = app.household().unwrap().snapshot().savings_accounts[0].id.to_string();
    run(&app, &["savings", "adjust", "--id", &acct, "--amount", "-100"]).unwrap();
    run(
        &app,
        &["savings-advance", "add", "--label", "Vacances", "--amount", "300", "--account", &acct],
    )
    .unwrap();
    assert!(run(&app, &["savings", "rm", "--id", &acct]).is_err());

    let adv = app.household().unwrap().snapshot().savings_advances[0].id.to_string();
    run(&app, &["savings-advance", "repay", "--id", &adv, "--amount", "300"]).unwrap();
    let hh = app.household().unwrap();
    assert_eq!(hh.snapshot().savings_accounts[0].balance, Decimal::from(900));
    assert!(hh.snapshot().savings_advances.is_empty());
}

#[test]
fn personal_toggle_and_comment() {
    let (_dir, app) = setup();
    run(&app, &["personal", "add", "--label", "Sport", "--amount", "25"]).unwrap();
    let id = app.household().unwrap().snapshot().personal_expenses[0].id.to_string();
    run(&app, &["personal", "toggle", "--id", &id]).unwrap();
    run(&app, &["personal", "comment", "--id", &id, "--text", "payé en espèces"]).unwrap();
    let hh = app.household().unwrap();
    let p = &hh.snapshot().personal_expenses[0];
    assert!(p.is_paid);
    assert_eq!(p.comment, "payé en espèces");
}

#[test]
fn config_changes_feed_the_totals() {
    let (_dir, app) = setup();
    run(&app, &["config", "set", "--key", "starting_balance", "--value", "2000"]).unwrap();
    run(&app, &["config", "set", "--key", "split_pattern", "--value", "immo"]).unwrap();
    assert!(run(&app, &["config", "set", "--key", "nope", "--value", "1"]).is_err());
    let mut hh = app.household().unwrap();
    let t = hh.totals(chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    assert_eq!(t.real_cash, Decimal::from(2000 - 155));
    // seeded Crédit Immo is 1250: ceil((2791.83 - 1250 + 379) / 2)
    assert_eq!(t.transfer_per_person, Decimal::from(961));
}

#[test]
fn users_do_not_see_each_other() {
    let (_dir, app) = setup();
    run(&app, &["fixed", "add", "--name", "Netflix", "--amount", "13"]).unwrap();
    run(&app, &["auth", "signout"]).unwrap();
    run(&app, &["auth", "signup", "--email", "z@b.fr", "--password", "secret2"]).unwrap();
    let hh = app.household().unwrap();
    assert!(hh.was_seeded());
    assert!(hh.snapshot().fixed_expenses.iter().all(|e| e.name != "Netflix"));
}

#[test]
fn read_only_commands_run() {
    let (dir, app) = setup();
    run(&app, &["summary", "--date", "2025-03-01"]).unwrap();
    run(&app, &["summary", "--json"]).unwrap();
    run(&app, &["projection"]).unwrap();
    run(&app, &["doctor"]).unwrap();
    run(&app, &["config", "show"]).unwrap();
    assert!(run(&app, &["summary", "--date", "03/01/2025"]).is_err());
    let out = dir.path().join("ledger.json");
    run(&app, &["export", "snapshot", "--out", out.to_str().unwrap()]).unwrap();
    assert!(std::fs::read_to_string(out).unwrap().contains("Crèche"));
}

#[test]
fn removing_a_savings_advance_gives_the_money_back() {
    let (_dir, app) = setup();
    run(&app, &["savings", "add", "--name", "PEL", "--balance", "500"]).unwrap();
    let acct = app.household().unwrap().snapshot().savings_accounts[0].id.to_string();
    run(
        &app,
        &["savings-advance", "add", "--label", "Oups", "--amount", "200", "--account", &acct],
    )
    .unwrap();
    let adv = app.household().unwrap().snapshot().savings_advances[0].id.to_string();
    run(&app, &["savings-advance", "rm", "--id", &adv]).unwrap();
    let hh = app.household().unwrap();
    assert_eq!(hh.snapshot().savings_accounts[0].balance, Decimal::from(500));
}

#[test]
fn oversized_amounts_are_refused() {
    let (_dir, app) = setup();
    assert!(run(&app, &["fixed", "add", "--name", "X", "--amount", "79228162514264337593543950335"]).is_err());
    assert!(app.household().unwrap().was_seeded());
}
