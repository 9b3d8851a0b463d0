// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring income definitions and the manual processing pass that credits
//! whatever has come due.

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::ledger::wallet::{self, Posting};
use crate::models::{
    NewRecurringIncome, RecurringIncome, RecurringIncomePatch, Timestamp, Transaction,
    TransactionKind,
};
use crate::schedule::{next_occurrence, Schedule};
use crate::session::Session;
use crate::utils::{date_col, date_sql, decimal_col, json_col, opt_date_col, opt_ts_col, ts_sql};

const ENTITY: &str = "Income";
const COLS: &str = "id, user_id, name, amount, category, description, schedule, start_date, end_date, next_scheduled_date, last_processed, is_active";

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

fn income_from_row(r: &Row) -> rusqlite::Result<RecurringIncome> {
    Ok(RecurringIncome {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        amount: decimal_col(r, 3)?,
        category: r.get(4)?,
        description: r.get(5)?,
        schedule: json_col::<Schedule>(r, 6)?,
        start_date: date_col(r, 7)?,
        end_date: opt_date_col(r, 8)?,
        next_scheduled_date: date_col(r, 9)?,
        last_processed: opt_ts_col(r, 10)?,
        is_active: r.get(11)?,
    })
}

fn load(conn: &Connection, session: &Session, id: i64) -> Result<RecurringIncome> {
    session.user_id()?;
    let sql = format!("SELECT {} FROM recurring_incomes WHERE id=?1", COLS);
    let income = conn
        .query_row(&sql, params![id], income_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found(ENTITY, id))?;
    session.check_owner(&income.user_id, ENTITY, id)?;
    Ok(income)
}

fn category_or_default(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn create_recurring_income(
    conn: &Connection,
    session: &Session,
    new: NewRecurringIncome,
) -> Result<RecurringIncome> {
    let user = session.user_id()?;
    if new.amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(new.amount));
    }
    let next = next_occurrence(&new.schedule, new.start_date)?;
    let now = ts_sql(&Utc::now());
    conn.execute(
        "INSERT INTO recurring_incomes(user_id, name, amount, category, description, schedule, start_date, end_date, next_scheduled_date, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
        params![
            user,
            new.name.trim(),
            new.amount.to_string(),
            category_or_default(&new.category),
            new.description,
            serde_json::to_string(&new.schedule)?,
            date_sql(&new.start_date),
            new.end_date.as_ref().map(date_sql),
            date_sql(&next),
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(user, id, next = %next, "recurring income created");
    load(conn, session, id)
}

pub fn get_recurring_income(conn: &Connection, session: &Session, id: i64) -> Result<RecurringIncome> {
    load(conn, session, id)
}

/// Active incomes, soonest first.
pub fn list_recurring_incomes(conn: &Connection, session: &Session) -> Result<Vec<RecurringIncome>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM recurring_incomes WHERE user_id=?1 AND is_active=1 ORDER BY next_scheduled_date, id",
        COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], income_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Applies `patch`. A new schedule or start date recomputes the next
/// scheduled date from the start date.
pub fn update_recurring_income(
    conn: &Connection,
    session: &Session,
    id: i64,
    patch: RecurringIncomePatch,
) -> Result<RecurringIncome> {
    let mut income = load(conn, session, id)?;
    let reschedule = patch.schedule.is_some() || patch.start_date.is_some();

    if let Some(name) = patch.name {
        income.name = name.trim().to_string();
    }
    if let Some(amount) = patch.amount {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }
        income.amount = amount;
    }
    if let Some(category) = patch.category {
        income.category = category_or_default(&category);
    }
    if let Some(description) = patch.description {
        income.description = description;
    }
    if let Some(schedule) = patch.schedule {
        income.schedule = schedule;
    }
    if let Some(start) = patch.start_date {
        income.start_date = start;
    }
    if let Some(end) = patch.end_date {
        income.end_date = end;
    }
    if let Some(active) = patch.is_active {
        income.is_active = active;
    }
    if reschedule {
        income.next_scheduled_date = next_occurrence(&income.schedule, income.start_date)?;
    }

    conn.execute(
        "UPDATE recurring_incomes SET name=?1, amount=?2, category=?3, description=?4, schedule=?5,
         start_date=?6, end_date=?7, next_scheduled_date=?8, is_active=?9, updated_at=?10 WHERE id=?11",
        params![
            income.name,
            income.amount.to_string(),
            income.category,
            income.description,
            serde_json::to_string(&income.schedule)?,
            date_sql(&income.start_date),
            income.end_date.as_ref().map(date_sql),
            date_sql(&income.next_scheduled_date),
            income.is_active,
            ts_sql(&Utc::now()),
            id,
        ],
    )?;
    Ok(income)
}

pub fn delete_recurring_income(conn: &Connection, session: &Session, id: i64) -> Result<()> {
    load(conn, session, id)?;
    conn.execute("DELETE FROM recurring_incomes WHERE id=?1", params![id])?;
    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct ProcessReport {
    pub credited: Vec<Transaction>,
    /// Income id and the reason it was skipped.
    pub failed: Vec<(i64, String)>,
}

fn due_incomes(conn: &Connection, user: &str, as_of: NaiveDate) -> Result<Vec<RecurringIncome>> {
    let sql = format!(
        "SELECT {} FROM recurring_incomes
         WHERE user_id=?1 AND is_active=1 AND next_scheduled_date<=?2
           AND (end_date IS NULL OR end_date>=next_scheduled_date)
         ORDER BY next_scheduled_date, id",
        COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user, date_sql(&as_of)], income_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// First scheduled date strictly after `today`. Only a weekly schedule can
/// land on `today` itself; it then moves on to the following week.
fn next_after(schedule: &Schedule, today: NaiveDate) -> Result<NaiveDate> {
    let next = next_occurrence(schedule, today)?;
    if next > today {
        return Ok(next);
    }
    next_occurrence(schedule, today + Duration::days(1))
}

fn process_one(
    conn: &mut Connection,
    session: &Session,
    income: &RecurringIncome,
    as_of: Timestamp,
) -> Result<Transaction> {
    let next = next_after(&income.schedule, as_of.date_naive())?;

    let tx = conn.transaction()?;
    let txn = wallet::post(
        &tx,
        session,
        Posting::new(
            income.amount,
            TransactionKind::Income,
            income.name.clone(),
            income.category.clone(),
        )
        .related_to(income.id)
        .allow_negative(true),
    )?;
    tx.execute(
        "UPDATE recurring_incomes SET last_processed=?1, next_scheduled_date=?2, updated_at=?1 WHERE id=?3",
        params![ts_sql(&as_of), date_sql(&next), income.id],
    )?;
    tx.commit()?;
    Ok(txn)
}

/// Credits every active income due on or before `as_of`, once each, and
/// advances its schedule. Each income commits on its own; a failure is
/// logged and reported without stopping the pass.
pub fn process_due_incomes(
    conn: &mut Connection,
    session: &Session,
    as_of: Timestamp,
) -> Result<ProcessReport> {
    let user = session.user_id()?.to_string();
    let due = due_incomes(conn, &user, as_of.date_naive())?;
    let mut report = ProcessReport::default();
    for income in &due {
        match process_one(conn, session, income, as_of) {
            Ok(txn) => {
                tracing::info!(
                    user = %user,
                    income = income.id,
                    amount = %txn.amount,
                    balance = %txn.balance_after,
                    "recurring income credited"
                );
                report.credited.push(txn);
            }
            Err(err) => {
                tracing::warn!(user = %user, income = income.id, error = %err, "failed to process recurring income");
                report.failed.push((income.id, err.to_string()));
            }
        }
    }
    Ok(report)
}
