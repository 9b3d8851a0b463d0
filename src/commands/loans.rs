// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use clap::ArgMatches;
use rusqlite::Connection;

use super::{
    allow_negative, decimal_arg, id, json_flags, opt_date_arg, opt_decimal_arg, optional,
    required,
};
use crate::ledger::loans;
use crate::models::{LoanPatch, NewLoan};
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let loan = loans::create_loan(
                conn,
                session,
                NewLoan {
                    name: required(sub, "name")?.to_string(),
                    lender: required(sub, "lender")?.to_string(),
                    initial_principal: decimal_arg(sub, "principal")?,
                    interest_rate: opt_decimal_arg(sub, "rate")?,
                    monthly_payment: decimal_arg(sub, "monthly_payment")?,
                    due_day: sub.get_one::<u32>("due_day").copied().unwrap_or(1),
                    start_date: opt_date_arg(sub, "start")?
                        .unwrap_or_else(|| Utc::now().date_naive()),
                },
            )?;
            println!(
                "Added loan #{} '{}' from {} ({})",
                loan.id,
                loan.name,
                loan.lender,
                fmt_money(&loan.initial_principal)
            );
        }
        Some(("list", sub)) => {
            let items = loans::list_loans(conn, session)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &items)? {
                return Ok(());
            }
            let rows = items
                .iter()
                .map(|l| {
                    vec![
                        l.id.to_string(),
                        l.name.clone(),
                        l.lender.clone(),
                        fmt_money(&l.current_balance),
                        l.interest_rate.map(|r| format!("{}%", r)).unwrap_or_default(),
                        fmt_money(&l.monthly_payment),
                        l.due_day.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["ID", "Name", "Lender", "Balance", "Rate", "Monthly", "Due day"],
                    rows
                )
            );
        }
        Some(("pay", sub)) => {
            let allow = allow_negative(conn, session, sub)?;
            let loan_id = id(sub)?;
            let payment =
                loans::make_payment(conn, session, loan_id, decimal_arg(sub, "amount")?, allow)?;
            println!(
                "Paid {} on loan #{} (principal {}, interest {})",
                fmt_money(&payment.amount),
                loan_id,
                fmt_money(&payment.principal_paid),
                fmt_money(&payment.interest_paid)
            );
        }
        Some(("history", sub)) => {
            let history = loans::payment_history(conn, session, id(sub)?)?;
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
                        fmt_money(&p.principal_paid),
                        fmt_money(&p.interest_paid),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Date", "Amount", "Principal", "Interest"], rows)
            );
        }
        Some(("edit", sub)) => {
            let patch = LoanPatch {
                name: optional(sub, "name").map(str::to_string),
                lender: optional(sub, "lender").map(str::to_string),
                interest_rate: opt_decimal_arg(sub, "rate")?,
                monthly_payment: opt_decimal_arg(sub, "monthly_payment")?,
                due_day: sub.get_one::<u32>("due_day").copied(),
                is_active: sub.get_flag("close").then_some(false),
            };
            let loan = loans::update_loan(conn, session, id(sub)?, patch)?;
            println!("Updated loan #{} '{}'", loan.id, loan.name);
        }
        _ => {}
    }
    Ok(())
}
