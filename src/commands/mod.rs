// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advances;
pub mod auth;
pub mod doctor;
pub mod entries;
pub mod expenses;
pub mod exporter;
pub mod history;
pub mod personal;
pub mod savings;
pub mod settings;
pub mod summary;

use crate::models::RecordId;
use crate::store::{Patch, parse_amount};
use crate::utils::parse_id;
use anyhow::{Context, Result};

pub(crate) fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.as_str())
        .with_context(|| format!("Missing --{}", name))
}

pub(crate) fn id_of(m: &clap::ArgMatches) -> Result<RecordId> {
    parse_id(required(m, "id")?)
}

pub(crate) fn amount_of(m: &clap::ArgMatches) -> Result<rust_decimal::Decimal> {
    Ok(parse_amount(required(m, "amount")?)?)
}

/// Patch from optional `--<label_field>` and `--amount` flags.
pub(crate) fn patch_of(m: &clap::ArgMatches, label_field: &str) -> Result<Patch> {
    let amount = match m.get_one::<String>("amount") {
        Some(a) => Some(parse_amount(a)?),
        None => None,
    };
    Ok(Patch {
        label: m.get_one::<String>(label_field).cloned(),
        amount,
        ..Default::default()
    })
}
