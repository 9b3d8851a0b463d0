// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

fn dec(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Stored amount '{}' is not a decimal", s))
}

/// Consistency problems across every user in the database, as
/// `(issue, detail)` pairs.
pub fn find_issues(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();

    // 1) Wallet balance disagrees with the last logged balance
    let mut stmt = conn.prepare("SELECT user_id, current_balance FROM wallets ORDER BY user_id")?;
    let wallets = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (user, balance) in wallets {
        let last: Option<String> = conn
            .query_row(
                "SELECT balance_after FROM transactions WHERE user_id=?1 ORDER BY date DESC, id DESC LIMIT 1",
                params![user],
                |r| r.get(0),
            )
            .optional()?;
        let expected = match last {
            Some(s) => dec(&s)?,
            None => Decimal::ZERO,
        };
        if dec(&balance)? != expected {
            issues.push((
                "wallet_log_mismatch".into(),
                format!("{}: wallet {} vs log {}", user, balance, expected),
            ));
        }
    }

    // 2) Transactions for users with no wallet
    let mut stmt = conn.prepare(
        "SELECT DISTINCT user_id FROM transactions EXCEPT SELECT user_id FROM wallets",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let user: String = r.get(0)?;
        issues.push(("txn_without_wallet".into(), user));
    }

    // 3) Loan balance disagrees with principal paid
    let mut stmt = conn.prepare("SELECT id, initial_principal, current_balance FROM loans")?;
    let loans = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut paid_stmt = conn.prepare("SELECT principal_paid FROM loan_payments WHERE loan_id=?1")?;
    for (id, initial, current) in loans {
        let paid = paid_stmt
            .query_map(params![id], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut expected = dec(&initial)?;
        for p in &paid {
            expected -= dec(p)?;
        }
        if dec(&current)? != expected {
            issues.push((
                "loan_balance_mismatch".into(),
                format!("loan {}: balance {} vs expected {}", id, current, expected),
            ));
        }
    }

    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = find_issues(conn)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        tracing::warn!(count = issues.len(), "doctor found issues");
        let rows = issues.into_iter().map(|(k, v)| vec![k, v]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
