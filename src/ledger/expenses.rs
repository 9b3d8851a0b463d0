// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::ledger::wallet::{self, Posting};
use crate::models::{Expense, ExpensePatch, NewExpense, Transaction, TransactionKind};
use crate::session::Session;
use crate::utils::{date_col, date_sql, decimal_col, opt_ts_col, ts_sql};

const ENTITY: &str = "Expense";
const COLS: &str = "id, user_id, name, description, amount, category, due_date, is_paid, paid_date, is_recurring, recurring_day";

fn expense_from_row(r: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        description: r.get(3)?,
        amount: decimal_col(r, 4)?,
        category: r.get(5)?,
        due_date: date_col(r, 6)?,
        is_paid: r.get(7)?,
        paid_date: opt_ts_col(r, 8)?,
        is_recurring: r.get(9)?,
        recurring_day: r.get(10)?,
    })
}

fn validate(amount: Decimal, recurring_day: Option<u32>) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    if let Some(day) = recurring_day {
        if !(1..=31).contains(&day) {
            return Err(Error::InvalidDueDate(day));
        }
    }
    Ok(())
}

/// Loads an expense and checks that the session owns it.
fn load(conn: &Connection, session: &Session, id: i64) -> Result<Expense> {
    session.user_id()?;
    let sql = format!("SELECT {} FROM expenses WHERE id=?1", COLS);
    let expense = conn
        .query_row(&sql, params![id], expense_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found(ENTITY, id))?;
    session.check_owner(&expense.user_id, ENTITY, id)?;
    Ok(expense)
}

/// Expenses are created unpaid.
pub fn create_expense(conn: &Connection, session: &Session, new: NewExpense) -> Result<Expense> {
    let user = session.user_id()?;
    validate(new.amount, new.recurring_day)?;
    let now = ts_sql(&Utc::now());
    conn.execute(
        "INSERT INTO expenses(user_id, name, description, amount, category, due_date, is_paid, is_recurring, recurring_day, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?9)",
        params![
            user,
            new.name.trim(),
            new.description,
            new.amount.to_string(),
            new.category.trim(),
            date_sql(&new.due_date),
            new.is_recurring,
            new.recurring_day,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(user, id, "expense created");
    load(conn, session, id)
}

pub fn get_expense(conn: &Connection, session: &Session, id: i64) -> Result<Expense> {
    load(conn, session, id)
}

/// All of the caller's expenses, earliest due first.
pub fn list_expenses(conn: &Connection, session: &Session) -> Result<Vec<Expense>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM expenses WHERE user_id=?1 ORDER BY due_date, id",
        COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], expense_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Pays an expense from the wallet. The wallet debit and the paid flag are
/// written in one transaction; an `InsufficientFunds` rejection leaves both
/// untouched.
pub fn mark_paid(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    allow_negative_balance: bool,
) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let expense = load(&tx, session, id)?;
    if expense.is_paid {
        return Err(Error::AlreadyPaid);
    }

    let txn = wallet::post(
        &tx,
        session,
        Posting::new(
            -expense.amount,
            TransactionKind::Expense,
            format!("Expense Payment - {}", expense.name),
            expense.category.clone(),
        )
        .related_to(id)
        .allow_negative(allow_negative_balance),
    )?;
    tx.execute(
        "UPDATE expenses SET is_paid=1, paid_date=?1, updated_at=?1 WHERE id=?2",
        params![ts_sql(&txn.date), id],
    )?;
    tx.commit()?;
    tracing::info!(
        user = %txn.user_id,
        expense = id,
        amount = %expense.amount,
        balance = %txn.balance_after,
        "expense paid"
    );
    Ok(txn)
}

/// Reverses a payment: credits the amount back as an adjustment and clears
/// the paid state. The credit is never refused for balance reasons.
pub fn mark_unpaid(conn: &mut Connection, session: &Session, id: i64) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let expense = load(&tx, session, id)?;
    if !expense.is_paid {
        return Err(Error::AlreadyUnpaid);
    }

    let txn = wallet::post(
        &tx,
        session,
        Posting::new(
            expense.amount,
            TransactionKind::Adjustment,
            format!("Reversed payment for: {}", expense.name),
            expense.category.clone(),
        )
        .related_to(id)
        .allow_negative(true),
    )?;
    tx.execute(
        "UPDATE expenses SET is_paid=0, paid_date=NULL, updated_at=?1 WHERE id=?2",
        params![ts_sql(&txn.date), id],
    )?;
    tx.commit()?;
    tracing::info!(
        user = %txn.user_id,
        expense = id,
        balance = %txn.balance_after,
        "expense payment reversed"
    );
    Ok(txn)
}

pub fn delete_expense(conn: &Connection, session: &Session, id: i64) -> Result<()> {
    let expense = load(conn, session, id)?;
    if expense.is_paid {
        return Err(Error::CannotModifyPaid { action: "delete" });
    }
    conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    tracing::debug!(user = %expense.user_id, id, "expense deleted");
    Ok(())
}

pub fn update_expense(
    conn: &Connection,
    session: &Session,
    id: i64,
    patch: ExpensePatch,
) -> Result<Expense> {
    let mut expense = load(conn, session, id)?;
    if expense.is_paid {
        return Err(Error::CannotModifyPaid { action: "update" });
    }

    if let Some(name) = patch.name {
        expense.name = name.trim().to_string();
    }
    if let Some(description) = patch.description {
        expense.description = description;
    }
    if let Some(amount) = patch.amount {
        expense.amount = amount;
    }
    if let Some(category) = patch.category {
        expense.category = category.trim().to_string();
    }
    if let Some(due_date) = patch.due_date {
        expense.due_date = due_date;
    }
    if let Some(is_recurring) = patch.is_recurring {
        expense.is_recurring = is_recurring;
    }
    if let Some(day) = patch.recurring_day {
        expense.recurring_day = day;
    }
    validate(expense.amount, expense.recurring_day)?;

    conn.execute(
        "UPDATE expenses SET name=?1, description=?2, amount=?3, category=?4, due_date=?5,
         is_recurring=?6, recurring_day=?7, updated_at=?8 WHERE id=?9",
        params![
            expense.name,
            expense.description,
            expense.amount.to_string(),
            expense.category,
            date_sql(&expense.due_date),
            expense.is_recurring,
            expense.recurring_day,
            ts_sql(&Utc::now()),
            id,
        ],
    )?;
    Ok(expense)
}
