// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cards;
pub mod doctor;
pub mod expenses;
pub mod exporter;
pub mod income;
pub mod loans;
pub mod prefs;
pub mod wallet;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::ArgMatches;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::config::Preferences;
use crate::session::Session;
use crate::utils::{parse_date, parse_decimal};

pub(crate) fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{}", name.replace('_', "-")))
}

pub(crate) fn optional<'a>(m: &'a ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name).map(String::as_str)
}

pub(crate) fn id(m: &ArgMatches) -> Result<i64> {
    m.get_one::<i64>("id").copied().ok_or_else(|| anyhow!("missing --id"))
}

pub(crate) fn decimal_arg(m: &ArgMatches, name: &str) -> Result<Decimal> {
    parse_decimal(required(m, name)?)
}

pub(crate) fn opt_decimal_arg(m: &ArgMatches, name: &str) -> Result<Option<Decimal>> {
    optional(m, name).map(parse_decimal).transpose()
}

pub(crate) fn date_arg(m: &ArgMatches, name: &str) -> Result<NaiveDate> {
    parse_date(required(m, name)?)
}

pub(crate) fn opt_date_arg(m: &ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    optional(m, name).map(parse_date).transpose()
}

/// `--allow-negative` on the command line, else the stored preference.
pub(crate) fn allow_negative(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<bool> {
    if m.get_flag("allow_negative") {
        return Ok(true);
    }
    Ok(Preferences::load(conn, session)?.allow_negative_balance)
}

/// Patch value for an optional field: `Some(None)` when `clear` is set.
pub(crate) fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

pub(crate) fn json_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}
