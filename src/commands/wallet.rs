// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::{allow_negative, decimal_arg, json_flags, opt_decimal_arg, required};
use crate::ledger::{self, Posting, wallet};
use crate::models::{Transaction, TransactionKind};
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

/// `init`: the schema is already in place once the connection is open; with a
/// user this also opens their wallet.
pub fn init(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    if session.current_user_id().is_none() {
        return Ok(());
    }
    let opening = opt_decimal_arg(m, "opening_balance")?.unwrap_or(Decimal::ZERO);
    let w = wallet::create_wallet(conn, session, opening)?;
    println!(
        "Wallet ready for '{}' with balance {}",
        w.user_id,
        fmt_money(&w.current_balance)
    );
    Ok(())
}

pub fn handle(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let (json, jsonl) = json_flags(sub);
            match wallet::get_wallet(conn, session)? {
                Some(w) => {
                    if maybe_print_json(json, jsonl, &w)? {
                        return Ok(());
                    }
                    println!(
                        "{}",
                        pretty_table(
                            &["User", "Balance", "Previous", "Last updated"],
                            vec![vec![
                                w.user_id.clone(),
                                fmt_money(&w.current_balance),
                                fmt_money(&w.previous_balance),
                                w.last_updated.format("%Y-%m-%d %H:%M").to_string(),
                            ]],
                        )
                    );
                }
                None => println!("No wallet yet; balance {}", fmt_money(&Decimal::ZERO)),
            }
        }
        Some(("set", sub)) => {
            let balance = decimal_arg(sub, "balance")?;
            let reason = required(sub, "reason")?;
            let txn = ledger::set_balance(conn, session, balance, reason)?;
            println!("Balance set to {}", fmt_money(&txn.balance_after));
        }
        Some(("history", sub)) => {
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(10);
            let txns = ledger::recent_transactions(conn, session, limit)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &txns)? {
                return Ok(());
            }
            println!("{}", transactions_table(&txns));
        }
        Some(("credit", sub)) => {
            let posting = Posting::new(
                decimal_arg(sub, "amount")?,
                TransactionKind::Income,
                required(sub, "description")?,
                required(sub, "category")?,
            );
            let txn = ledger::debit_or_credit(conn, session, posting)?;
            println!(
                "Credited {}; balance {}",
                fmt_money(&txn.amount),
                fmt_money(&txn.balance_after)
            );
        }
        Some(("debit", sub)) => {
            let amount = decimal_arg(sub, "amount")?;
            let allow = allow_negative(conn, session, sub)?;
            let posting = Posting::new(
                -amount.abs(),
                TransactionKind::Expense,
                required(sub, "description")?,
                required(sub, "category")?,
            )
            .allow_negative(allow);
            let txn = ledger::debit_or_credit(conn, session, posting)?;
            println!(
                "Debited {}; balance {}",
                fmt_money(&txn.amount.abs()),
                fmt_money(&txn.balance_after)
            );
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn transactions_table(txns: &[Transaction]) -> comfy_table::Table {
    let rows = txns
        .iter()
        .map(|t| {
            vec![
                t.date.format("%Y-%m-%d %H:%M").to_string(),
                t.kind.to_string(),
                t.category.clone(),
                t.description.clone(),
                fmt_money(&t.amount),
                fmt_money(&t.balance_after),
            ]
        })
        .collect();
    pretty_table(
        &["Date", "Kind", "Category", "Description", "Amount", "Balance"],
        rows,
    )
}
