// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;

use super::required;
use crate::ledger::wallet::all_transactions;
use crate::session::Session;
use crate::utils::ts_sql;

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, session, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let txns = all_transactions(conn, session)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "kind",
                "category",
                "description",
                "amount",
                "balance_after",
                "related_entity_id",
            ])?;
            for t in &txns {
                wtr.write_record([
                    ts_sql(&t.date),
                    t.kind.to_string(),
                    t.category.clone(),
                    t.description.clone(),
                    t.amount.to_string(),
                    t.balance_after.to_string(),
                    t.related_entity_id.map(|id| id.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = txns
                .iter()
                .map(|t| {
                    json!({
                        "date": ts_sql(&t.date),
                        "kind": t.kind,
                        "category": t.category,
                        "description": t.description,
                        "amount": t.amount.to_string(),
                        "balance_after": t.balance_after.to_string(),
                        "related_entity_id": t.related_entity_id,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(count = txns.len(), path = out, "transactions exported");
    println!("Exported {} transactions to {}", txns.len(), out);
    Ok(())
}
