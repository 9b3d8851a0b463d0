// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::{
    allow_negative, clearable, date_arg, decimal_arg, id, json_flags, opt_date_arg, opt_decimal_arg,
    optional, required,
};
use crate::ledger::expenses;
use crate::models::{ExpensePatch, NewExpense};
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let recurring_day = sub.get_one::<u32>("recurring_day").copied();
            let expense = expenses::create_expense(
                conn,
                session,
                NewExpense {
                    name: required(sub, "name")?.to_string(),
                    description: optional(sub, "description").map(str::to_string),
                    amount: decimal_arg(sub, "amount")?,
                    category: required(sub, "category")?.to_string(),
                    due_date: date_arg(sub, "due")?,
                    is_recurring: recurring_day.is_some(),
                    recurring_day,
                },
            )?;
            println!(
                "Added expense #{} '{}' {} due {}",
                expense.id,
                expense.name,
                fmt_money(&expense.amount),
                expense.due_date
            );
        }
        Some(("list", sub)) => {
            let items = expenses::list_expenses(conn, session)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &items)? {
                return Ok(());
            }
            let rows = items
                .iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.name.clone(),
                        e.category.clone(),
                        fmt_money(&e.amount),
                        e.due_date.to_string(),
                        if e.is_paid { "paid" } else { "unpaid" }.to_string(),
                        e.recurring_day.map(|d| d.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["ID", "Name", "Category", "Amount", "Due", "Status", "Repeats on"],
                    rows
                )
            );
        }
        Some(("pay", sub)) => {
            let allow = allow_negative(conn, session, sub)?;
            let txn = expenses::mark_paid(conn, session, id(sub)?, allow)?;
            println!(
                "{}; balance {}",
                txn.description,
                fmt_money(&txn.balance_after)
            );
        }
        Some(("unpay", sub)) => {
            let txn = expenses::mark_unpaid(conn, session, id(sub)?)?;
            println!(
                "{}; balance {}",
                txn.description,
                fmt_money(&txn.balance_after)
            );
        }
        Some(("edit", sub)) => {
            let recurring_day = sub.get_one::<u32>("recurring_day").copied();
            let one_off = sub.get_flag("one_off");
            let patch = ExpensePatch {
                name: optional(sub, "name").map(str::to_string),
                description: clearable(
                    optional(sub, "description").map(str::to_string),
                    sub.get_flag("clear_description"),
                ),
                amount: opt_decimal_arg(sub, "amount")?,
                category: optional(sub, "category").map(str::to_string),
                due_date: opt_date_arg(sub, "due")?,
                is_recurring: if one_off {
                    Some(false)
                } else {
                    recurring_day.map(|_| true)
                },
                recurring_day: clearable(recurring_day, one_off),
            };
            let expense = expenses::update_expense(conn, session, id(sub)?, patch)?;
            println!("Updated expense #{} '{}'", expense.id, expense.name);
        }
        Some(("rm", sub)) => {
            let expense_id = id(sub)?;
            expenses::delete_expense(conn, session, expense_id)?;
            println!("Removed expense #{}", expense_id);
        }
        _ => {}
    }
    Ok(())
}
