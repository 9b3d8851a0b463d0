// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Months, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::ledger::wallet::{self, Posting};
use crate::models::{CardPayment, CreditCard, NewCreditCard, TransactionKind};
use crate::session::Session;
use crate::utils::{date_col, date_sql, decimal_col, opt_decimal_col, ts_col, ts_sql};

const ENTITY: &str = "Credit card";
const COLS: &str = "id, user_id, name, statement_balance, due_day, minimum_payment, allow_overpayment, is_active, last_statement_date, next_statement_date";

pub const CARD_CATEGORY: &str = "Credit Card";

fn card_from_row(r: &Row) -> rusqlite::Result<CreditCard> {
    Ok(CreditCard {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        statement_balance: decimal_col(r, 3)?,
        due_day: r.get(4)?,
        minimum_payment: opt_decimal_col(r, 5)?,
        allow_overpayment: r.get(6)?,
        is_active: r.get(7)?,
        last_statement_date: ts_col(r, 8)?,
        next_statement_date: date_col(r, 9)?,
        payment_history: Vec::new(),
    })
}

fn payments_for(conn: &Connection, card_id: i64) -> Result<Vec<CardPayment>> {
    let mut stmt = conn.prepare(
        "SELECT date, amount, statement_period_start, statement_period_end
         FROM card_payments WHERE card_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![card_id], |r| {
        Ok(CardPayment {
            date: ts_col(r, 0)?,
            amount: decimal_col(r, 1)?,
            statement_period_start: ts_col(r, 2)?,
            statement_period_end: date_col(r, 3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn load(conn: &Connection, session: &Session, id: i64) -> Result<CreditCard> {
    session.user_id()?;
    let sql = format!("SELECT {} FROM credit_cards WHERE id=?1", COLS);
    let mut card = conn
        .query_row(&sql, params![id], card_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found(ENTITY, id))?;
    session.check_owner(&card.user_id, ENTITY, id)?;
    card.payment_history = payments_for(conn, id)?;
    Ok(card)
}

fn month_after(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| Error::InvalidDueDate(date.day()))
}

/// Stores the day-of-month of `due_date`; the next statement is expected one
/// month after it.
pub fn create_card(conn: &Connection, session: &Session, new: NewCreditCard) -> Result<CreditCard> {
    let user = session.user_id()?;
    if new.statement_balance < Decimal::ZERO {
        return Err(Error::InvalidAmount(new.statement_balance));
    }
    if let Some(min) = new.minimum_payment.filter(|m| *m < Decimal::ZERO) {
        return Err(Error::InvalidAmount(min));
    }
    let now = Utc::now();
    let next_statement = month_after(new.due_date)?;
    conn.execute(
        "INSERT INTO credit_cards(user_id, name, statement_balance, due_day, minimum_payment, allow_overpayment, is_active, last_statement_date, next_statement_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?7, ?7)",
        params![
            user,
            new.name.trim(),
            new.statement_balance.to_string(),
            new.due_date.day(),
            new.minimum_payment.map(|m| m.to_string()),
            new.allow_overpayment,
            ts_sql(&now),
            date_sql(&next_statement),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(user, id, "credit card created");
    load(conn, session, id)
}

pub fn get_card(conn: &Connection, session: &Session, id: i64) -> Result<CreditCard> {
    load(conn, session, id)
}

pub fn list_cards(conn: &Connection, session: &Session) -> Result<Vec<CreditCard>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM credit_cards WHERE user_id=?1 AND is_active=1 ORDER BY due_day, id",
        COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], card_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        let mut card = row?;
        card.payment_history = payments_for(conn, card.id)?;
        out.push(card);
    }
    Ok(out)
}

pub fn payment_history(conn: &Connection, session: &Session, id: i64) -> Result<Vec<CardPayment>> {
    Ok(load(conn, session, id)?.payment_history)
}

/// Pays down the statement balance from the wallet. Overpaying is refused
/// unless the card allows it; a refusal touches nothing.
pub fn make_payment(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    amount: Decimal,
    allow_negative_balance: bool,
) -> Result<CardPayment> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    let tx = conn.transaction()?;
    let card = load(&tx, session, id)?;
    if !card.allow_overpayment && amount > card.statement_balance {
        tracing::warn!(
            card = id,
            amount = %amount,
            statement_balance = %card.statement_balance,
            "rejected: overpayment not allowed"
        );
        return Err(Error::PaymentExceedsBalance {
            statement_balance: card.statement_balance,
            amount,
        });
    }

    let txn = wallet::post(
        &tx,
        session,
        Posting::new(
            -amount,
            TransactionKind::CreditCardPayment,
            format!("Credit Card Payment - {}", card.name),
            CARD_CATEGORY,
        )
        .related_to(id)
        .allow_negative(allow_negative_balance),
    )?;

    let payment = CardPayment {
        date: txn.date,
        amount,
        statement_period_start: card.last_statement_date,
        statement_period_end: card.next_statement_date,
    };
    let new_balance = card.statement_balance - amount;
    tx.execute(
        "UPDATE credit_cards SET statement_balance=?1, updated_at=?2 WHERE id=?3",
        params![new_balance.to_string(), ts_sql(&payment.date), id],
    )?;
    tx.execute(
        "INSERT INTO card_payments(card_id, date, amount, statement_period_start, statement_period_end)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            ts_sql(&payment.date),
            amount.to_string(),
            ts_sql(&payment.statement_period_start),
            date_sql(&payment.statement_period_end),
        ],
    )?;
    tx.commit()?;
    tracing::info!(
        user = %txn.user_id,
        card = id,
        amount = %amount,
        statement_balance = %new_balance,
        "card payment applied"
    );
    Ok(payment)
}

/// Opens a new statement cycle. Does not touch the wallet.
pub fn update_statement_balance(
    conn: &Connection,
    session: &Session,
    id: i64,
    new_balance: Decimal,
    new_due_date: NaiveDate,
) -> Result<CreditCard> {
    load(conn, session, id)?;
    let next_statement = month_after(new_due_date)?;
    conn.execute(
        "UPDATE credit_cards SET statement_balance=?1, due_day=?2, last_statement_date=?3, next_statement_date=?4, updated_at=?3 WHERE id=?5",
        params![
            new_balance.to_string(),
            new_due_date.day(),
            ts_sql(&Utc::now()),
            date_sql(&next_statement),
            id,
        ],
    )?;
    tracing::info!(card = id, statement_balance = %new_balance, "statement updated");
    load(conn, session, id)
}

pub fn update_due_date(conn: &Connection, session: &Session, id: i64, day: u32) -> Result<CreditCard> {
    if !(1..=31).contains(&day) {
        return Err(Error::InvalidDueDate(day));
    }
    load(conn, session, id)?;
    conn.execute(
        "UPDATE credit_cards SET due_day=?1, updated_at=?2 WHERE id=?3",
        params![day, ts_sql(&Utc::now()), id],
    )?;
    load(conn, session, id)
}
