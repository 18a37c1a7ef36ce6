// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use nexus_ledger::models::{Collection, FixedExpense, Snapshot};
use nexus_ledger::store::{FixedClock, LedgerStore, MAX_AMOUNT, NewRecord, Patch};
use nexus_ledger::totals::{SplitRule, TotalsCache, TotalsConfig, compute, provision_for};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn store() -> LedgerStore<FixedClock> {
    LedgerStore::with_clock(FixedClock {
        millis: 1_700_000_000_000,
        date: date(2025, 3, 10),
    })
}

fn add(st: &LedgerStore<FixedClock>, s: &Snapshot, r: NewRecord) -> (Snapshot, i64) {
    st.add(s, r).unwrap()
}

fn household_1791() -> Snapshot {
    let st = store();
    let mut s = Snapshot::default();
    for (name, amt) in [("Loyer", "250"), ("Charges Copro", "260"), ("Crèche", "1281.83")] {
        s = add(
            &st,
            &s,
            NewRecord::FixedExpense {
                name: name.into(),
                amount: d(amt),
            },
        )
        .0;
    }
    for (name, amt) in [("Taxe Foncière", "2700"), ("Assurances/Divers", "1848")] {
        s = add(
            &st,
            &s,
            NewRecord::AnnualExpense {
                name: name.into(),
                amount: d(amt),
            },
        )
        .0;
    }
    s
}

#[test]
fn sums_do_not_depend_on_order() {
    let mut s = Snapshot::default();
    s.fixed_expenses = vec![
        FixedExpense { id: 1, name: "a".into(), amount: d("10.10") },
        FixedExpense { id: 2, name: "b".into(), amount: d("0.20") },
        FixedExpense { id: 3, name: "c".into(), amount: d("5") },
    ];
    let mut reversed = s.clone();
    reversed.fixed_expenses.reverse();
    let cfg = TotalsConfig::default();
    let a = compute(&s, &cfg, date(2025, 1, 1));
    let b = compute(&reversed, &cfg, date(2025, 1, 1));
    assert_eq!(a.total_fixed, d("15.30"));
    assert_eq!(a.total_fixed, b.total_fixed);
    assert_eq!(a.total_annual, Decimal::ZERO);
}

#[test]
fn empty_ledger_is_all_zero() {
    let t = compute(&Snapshot::default(), &TotalsConfig::default(), date(2025, 1, 20));
    assert_eq!(t.total_fixed, Decimal::ZERO);
    assert_eq!(t.provision, Decimal::ZERO);
    assert_eq!(t.transfer_per_person, Decimal::ZERO);
    assert_eq!(t.total_pending, Decimal::ZERO);
    assert_eq!(t.real_cash, Decimal::from(1429));
    assert_eq!(t.projection.len(), 12);
    assert!(t.projection.iter().all(|p| p.balance == Decimal::from(1429)));
}

#[test]
fn provision_rounds_half_away_from_zero() {
    assert_eq!(provision_for(Decimal::from(1800)), Decimal::from(150));
    // 150.4166...
    assert_eq!(provision_for(Decimal::from(1805)), Decimal::from(150));
    // 150.5 would be 150 under half-to-even
    assert_eq!(provision_for(Decimal::from(1806)), Decimal::from(151));
    // 151.5
    assert_eq!(provision_for(Decimal::from(1818)), Decimal::from(152));
    assert_eq!(provision_for(Decimal::from(4548)), Decimal::from(379));
}

#[test]
fn transfer_excludes_creche_and_rounds_up() {
    let s = household_1791();
    let t = compute(&s, &TotalsConfig::default(), date(2025, 1, 5));
    assert_eq!(t.total_fixed, d("1791.83"));
    assert_eq!(t.total_annual, Decimal::from(4548));
    assert_eq!(t.provision, Decimal::from(379));
    assert_eq!(t.split_excluded, d("1281.83"));
    // ceil((1791.83 - 1281.83 + 379) / 2) = ceil(444.5)
    assert_eq!(t.transfer_per_person, Decimal::from(445));
}

#[test]
fn renaming_into_the_excluded_category_changes_the_transfer() {
    let st = store();
    let s = Snapshot::default();
    let (s, _) = add(&st, &s, NewRecord::FixedExpense { name: "Loyer".into(), amount: d("1000") });
    let (s, garde) = add(&st, &s, NewRecord::FixedExpense { name: "Garde".into(), amount: d("400") });
    let cfg = TotalsConfig::default();
    let before = compute(&s, &cfg, date(2025, 1, 1));
    assert_eq!(before.transfer_per_person, Decimal::from(700));

    let s = st
        .update(&s, Collection::Fixed, garde, &Patch::label("Garde CRÈCHE du soir"))
        .unwrap();
    let after = compute(&s, &cfg, date(2025, 1, 1));
    assert_eq!(after.split_excluded, Decimal::from(400));
    assert_eq!(after.transfer_per_person, Decimal::from(500));
}

#[test]
fn first_matching_charge_is_the_one_excluded() {
    let mut s = Snapshot::default();
    s.fixed_expenses = vec![
        FixedExpense { id: 1, name: "Crèche A".into(), amount: d("100") },
        FixedExpense { id: 2, name: "Crèche B".into(), amount: d("300") },
    ];
    let t = compute(&s, &TotalsConfig::default(), date(2025, 1, 1));
    assert_eq!(t.split_excluded, Decimal::from(100));
    assert_eq!(t.transfer_per_person, Decimal::from(150));
}

#[test]
fn configurable_rule_and_party_count() {
    let s = household_1791();
    let cfg = TotalsConfig {
        split_rule: SplitRule::regex("^loyer$").unwrap(),
        parties: 3,
        ..Default::default()
    };
    let t = compute(&s, &cfg, date(2025, 1, 1));
    assert_eq!(t.split_excluded, Decimal::from(250));
    // (1791.83 - 250 + 379) / 3 = 640.28 -> 641
    assert_eq!(t.transfer_per_person, Decimal::from(641));
}

#[test]
fn real_cash_accrues_one_provision_per_elapsed_month() {
    let st = store();
    let s = household_1791();
    let (s, _) = add(&st, &s, NewRecord::PendingAdvance { label: "Dépenses 2025".into(), amount: d("155") });
    let (s, _) = add(&st, &s, NewRecord::Reimbursement { label: "CAF".into(), amount: d("100") });
    let (s, _) = add(&st, &s, NewRecord::ExceptionalPayment { label: "Plombier".into(), amount: d("40") });

    let cfg = TotalsConfig::default();
    let jan = compute(&s, &cfg, date(2025, 1, 31));
    assert_eq!(jan.months_elapsed, 0);
    // 1429 + 100 - 40 - 155
    assert_eq!(jan.real_cash, Decimal::from(1334));

    let apr = compute(&s, &cfg, date(2025, 4, 2));
    assert_eq!(apr.months_elapsed, 3);
    assert_eq!(apr.real_cash, Decimal::from(1334 + 3 * 379));

    let flat = TotalsConfig {
        accrue_provision: false,
        ..Default::default()
    };
    assert_eq!(compute(&s, &flat, date(2025, 4, 2)).real_cash, Decimal::from(1334));
}

#[test]
fn projection_steps_by_provision_from_the_baseline() {
    let s = Snapshot::seeded();
    let t = compute(&s, &TotalsConfig::default(), date(2025, 9, 1));
    let labels: Vec<&str> = t.projection.iter().map(|p| p.month.as_str()).collect();
    assert_eq!(
        labels,
        ["Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc"]
    );
    // baseline = 1429 - 155
    assert_eq!(t.projection[0].balance, Decimal::from(1274));
    assert_eq!(t.projection[11].balance, Decimal::from(1274 + 11 * 379));
}

#[test]
fn projection_rounds_fractional_baseline() {
    let mut s = Snapshot::default();
    s.pending.push(nexus_ledger::models::PendingAdvance {
        id: 1,
        label: "x".into(),
        amount: d("0.5"),
    });
    let t = compute(&s, &TotalsConfig::default(), date(2025, 1, 1));
    // 1428.5 rounds away from zero
    assert_eq!(t.projection[0].balance, Decimal::from(1429));
    assert_eq!(t.real_cash, d("1428.5"));
}

#[test]
fn seeded_household_figures() {
    let t = compute(&Snapshot::seeded(), &TotalsConfig::default(), date(2025, 1, 1));
    assert_eq!(t.total_fixed, d("2791.83"));
    assert_eq!(t.provision, Decimal::from(379));
    assert_eq!(t.transfer_per_person, Decimal::from(945));
    assert_eq!(t.total_pending, Decimal::from(155));
}

#[test]
fn absorb_moves_the_amount_from_pending_to_paid() {
    let st = store();
    let s = Snapshot::seeded();
    let cfg = TotalsConfig::default();
    let before = compute(&s, &cfg, date(2025, 2, 1));
    let adv = s.pending[0].id;
    let after_snap = st.absorb(&s, adv).unwrap();
    let after = compute(&after_snap, &cfg, date(2025, 2, 1));
    assert_eq!(after.total_paid - before.total_paid, Decimal::from(155));
    assert_eq!(before.total_pending - after.total_pending, Decimal::from(155));
    assert_eq!(after.total_reimbursed, before.total_reimbursed);
    assert_eq!(after.real_cash, before.real_cash);
}

#[test]
fn personal_and_savings_totals() {
    let st = store();
    let s = Snapshot::default();
    let (s, acct) = add(&st, &s, NewRecord::SavingsAccount { name: "Livret A".into(), balance: d("500") });
    let (s, _) = add(
        &st,
        &s,
        NewRecord::SavingsAdvance { label: "Voiture".into(), amount: d("200"), target_account_id: acct },
    );
    let (s, p1) = add(
        &st,
        &s,
        NewRecord::PersonalExpense { label: "Coiffeur".into(), amount: d("30"), comment: String::new() },
    );
    let (s, _) = add(
        &st,
        &s,
        NewRecord::PersonalExpense { label: "Livres".into(), amount: d("45.5"), comment: "Fnac".into() },
    );
    let s = st.toggle_personal_paid(&s, p1).unwrap();
    let t = compute(&s, &TotalsConfig::default(), date(2025, 1, 1));
    assert_eq!(t.total_savings, Decimal::from(300));
    assert_eq!(t.total_savings_advances, Decimal::from(200));
    assert_eq!(t.personal_total, d("75.5"));
    assert_eq!(t.personal_paid, Decimal::from(30));
    assert_eq!(t.personal_remaining, d("45.5"));
}

#[test]
fn cache_reuses_results_for_equal_inputs() {
    let mut cache = TotalsCache::new();
    let cfg = TotalsConfig::default();
    let s = Snapshot::seeded();
    let a = cache.get(&s, &cfg, date(2025, 5, 1));
    let mut bumped = s.clone();
    bumped.revision += 7;
    let b = cache.get(&bumped, &cfg, date(2025, 5, 1));
    assert_eq!(a, b);
    assert_eq!(cache.hits(), 1);

    let mut changed = s.clone();
    changed.fixed_expenses[0].amount += Decimal::ONE;
    let c = cache.get(&changed, &cfg, date(2025, 5, 1));
    assert_eq!(cache.hits(), 1);
    assert_eq!(c.total_fixed - a.total_fixed, Decimal::ONE);
}

#[test]
fn largest_accepted_amounts_do_not_overflow() {
    let st = store();
    let mut s = Snapshot::default();
    for name in ["A", "B", "Crèche"] {
        s = add(&st, &s, NewRecord::FixedExpense { name: name.into(), amount: MAX_AMOUNT }).0;
        s = add(&st, &s, NewRecord::AnnualExpense { name: name.into(), amount: MAX_AMOUNT }).0;
        s = add(&st, &s, NewRecord::PendingAdvance { label: name.into(), amount: MAX_AMOUNT }).0;
        s = add(&st, &s, NewRecord::ExceptionalPayment { label: name.into(), amount: MAX_AMOUNT }).0;
    }
    let t = compute(&s, &TotalsConfig::default(), date(2025, 12, 31));
    assert_eq!(t.total_fixed, MAX_AMOUNT * Decimal::from(3));
    assert_eq!(t.provision, Decimal::from(250_000_000));
    assert_eq!(t.projection.len(), 12);
}
