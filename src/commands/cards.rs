// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use clap::ArgMatches;
use rusqlite::Connection;

use super::{allow_negative, date_arg, decimal_arg, id, json_flags, opt_decimal_arg, required};
use crate::config::{OverpaymentPolicy, Preferences};
use crate::ledger::cards;
use crate::models::NewCreditCard;
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let allow_overpayment = sub.get_flag("allow_overpayment")
                || Preferences::load(conn, session)?.card_overpayment == OverpaymentPolicy::Allow;
            let card = cards::create_card(
                conn,
                session,
                NewCreditCard {
                    name: required(sub, "name")?.to_string(),
                    statement_balance: decimal_arg(sub, "balance")?,
                    due_date: date_arg(sub, "due")?,
                    minimum_payment: opt_decimal_arg(sub, "minimum")?,
                    allow_overpayment,
                },
            )?;
            println!(
                "Added card #{} '{}' balance {} due day {}",
                card.id,
                card.name,
                fmt_money(&card.statement_balance),
                card.due_day
            );
        }
        Some(("list", sub)) => {
            let items = cards::list_cards(conn, session)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &items)? {
                return Ok(());
            }
            let rows = items
                .iter()
                .map(|c| {
                    vec![
                        c.id.to_string(),
                        c.name.clone(),
                        fmt_money(&c.statement_balance),
                        c.minimum_payment.as_ref().map(fmt_money).unwrap_or_default(),
                        c.due_day.to_string(),
                        c.next_statement_date.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["ID", "Name", "Statement", "Minimum", "Due day", "Next statement"],
                    rows
                )
            );
        }
        Some(("pay", sub)) => {
            let allow = allow_negative(conn, session, sub)?;
            let card_id = id(sub)?;
            let payment =
                cards::make_payment(conn, session, card_id, decimal_arg(sub, "amount")?, allow)?;
            println!(
                "Paid {} on card #{} for statement ending {}",
                fmt_money(&payment.amount),
                card_id,
                payment.statement_period_end
            );
        }
        Some(("statement", sub)) => {
            let card = cards::update_statement_balance(
                conn,
                session,
                id(sub)?,
                decimal_arg(sub, "balance")?,
                date_arg(sub, "due")?,
            )?;
            println!(
                "Card #{} statement {} due day {}",
                card.id,
                fmt_money(&card.statement_balance),
                card.due_day
            );
        }
        Some(("due", sub)) => {
            let day = sub
                .get_one::<u32>("day")
                .copied()
                .ok_or_else(|| anyhow!("missing --day"))?;
            let card = cards::update_due_date(conn, session, id(sub)?, day)?;
            println!("Card #{} now due on day {}", card.id, card.due_day);
        }
        Some(("history", sub)) => {
            let history = cards::payment_history(conn, session, id(sub)?)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &history)? {
                return Ok(());
            }
            let rows = history
                .iter()
                .map(|p| {
                    vec![
                        p.date.format("%Y-%m-%d").to_string(),
                        fmt_money(&p.amount),
                        p.statement_period_start.format("%Y-%m-%d").to_string(),
                        p.statement_period_end.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Date", "Amount", "Period start", "Period end"], rows)
            );
        }
        _ => {}
    }
    Ok(())
}
