// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use clap::ArgMatches;
use rusqlite::Connection;

use super::{json_flags, optional};
use crate::config::Preferences;
use crate::session::Session;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let prefs = Preferences::load(conn, session)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &prefs)? {
                return Ok(());
            }
            println!(
                "{}",
                pretty_table(
                    &["Key", "Value"],
                    vec![
                        vec![
                            "allow_negative_balance".into(),
                            prefs.allow_negative_balance.to_string(),
                        ],
                        vec!["card_overpayment".into(), prefs.card_overpayment.to_string()],
                    ],
                )
            );
        }
        Some(("set", sub)) => {
            let mut prefs = Preferences::load(conn, session)?;
            if let Some(allow) = sub.get_one::<bool>("allow_negative") {
                prefs.allow_negative_balance = *allow;
            }
            if let Some(policy) = optional(sub, "card_overpayment") {
                prefs.card_overpayment = policy.parse().map_err(|e: String| anyhow!(e))?;
            }
            prefs.save(conn, session)?;
            println!(
                "Preferences saved: allow_negative_balance={}, card_overpayment={}",
                prefs.allow_negative_balance, prefs.card_overpayment
            );
        }
        _ => {}
    }
    Ok(())
}
