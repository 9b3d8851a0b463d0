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
    clearable, date_arg, decimal_arg, id, json_flags, opt_date_arg, opt_decimal_arg, optional, required,
};
use crate::ledger::income;
use crate::models::{NewRecurringIncome, RecurringIncomePatch};
use crate::schedule::Schedule;
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &mut Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let schedule: Schedule = required(sub, "schedule")?.parse()?;
            let created = income::create_recurring_income(
                conn,
                session,
                NewRecurringIncome {
                    name: required(sub, "name")?.to_string(),
                    amount: decimal_arg(sub, "amount")?,
                    category: optional(sub, "category").unwrap_or_default().to_string(),
                    description: optional(sub, "description").map(str::to_string),
                    schedule,
                    start_date: date_arg(sub, "start")?,
                    end_date: opt_date_arg(sub, "end")?,
                },
            )?;
            println!(
                "Added income #{} '{}' {} ({}), next on {}",
                created.id,
                created.name,
                fmt_money(&created.amount),
                created.schedule,
                created.next_scheduled_date
            );
        }
        Some(("list", sub)) => {
            let items = income::list_recurring_incomes(conn, session)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &items)? {
                return Ok(());
            }
            let rows = items
                .iter()
                .map(|i| {
                    vec![
                        i.id.to_string(),
                        i.name.clone(),
                        fmt_money(&i.amount),
                        i.schedule.to_string(),
                        i.next_scheduled_date.to_string(),
                        i.end_date.map(|d| d.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Name", "Amount", "Schedule", "Next", "Ends"], rows)
            );
        }
        Some(("edit", sub)) => {
            let is_active = if sub.get_flag("pause") {
                Some(false)
            } else if sub.get_flag("resume") {
                Some(true)
            } else {
                None
            };
            let patch = RecurringIncomePatch {
                name: optional(sub, "name").map(str::to_string),
                amount: opt_decimal_arg(sub, "amount")?,
                category: optional(sub, "category").map(str::to_string),
                description: clearable(
                    optional(sub, "description").map(str::to_string),
                    sub.get_flag("clear_description"),
                ),
                schedule: optional(sub, "schedule")
                    .map(|s| s.parse::<Schedule>())
                    .transpose()?,
                start_date: opt_date_arg(sub, "start")?,
                end_date: clearable(opt_date_arg(sub, "end")?, sub.get_flag("clear_end")),
                is_active,
            };
            let updated = income::update_recurring_income(conn, session, id(sub)?, patch)?;
            println!(
                "Updated income #{} '{}', next on {}",
                updated.id, updated.name, updated.next_scheduled_date
            );
        }
        Some(("rm", sub)) => {
            let income_id = id(sub)?;
            income::delete_recurring_income(conn, session, income_id)?;
            println!("Removed income #{}", income_id);
        }
        Some(("process", sub)) => {
            let as_of = match opt_date_arg(sub, "as_of")? {
                Some(day) => day
                    .and_hms_opt(23, 59, 59)
                    .map(|t| t.and_utc())
                    .unwrap_or_else(Utc::now),
                None => Utc::now(),
            };
            let report = income::process_due_incomes(conn, session, as_of)?;
            let (json, jsonl) = json_flags(sub);
            if maybe_print_json(json, jsonl, &report)? {
                return Ok(());
            }
            for txn in &report.credited {
                println!(
                    "Credited {} from '{}'; balance {}",
                    fmt_money(&txn.amount),
                    txn.description,
                    fmt_money(&txn.balance_after)
                );
            }
            for (income_id, reason) in &report.failed {
                eprintln!("Income #{} skipped: {}", income_id, reason);
            }
            if report.credited.is_empty() && report.failed.is_empty() {
                println!("Nothing due");
            }
        }
        _ => {}
    }
    Ok(())
}
