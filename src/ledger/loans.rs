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
use crate::models::{Loan, LoanPatch, LoanPayment, NewLoan, TransactionKind};
use crate::session::Session;
use crate::utils::{date_col, date_sql, decimal_col, opt_decimal_col, ts_col, ts_sql};

const ENTITY: &str = "Loan";
const COLS: &str = "id, user_id, name, lender, initial_principal, current_balance, interest_rate, monthly_payment, due_day, start_date, is_active";

pub const LOAN_CATEGORY: &str = "Loan";

/// Principal and interest portions of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub principal: Decimal,
    pub interest: Decimal,
}

/// Splits `amount` into interest and principal using one month of simple
/// interest on `balance` at the annual percentage `rate`. Interest due is
/// kept at full precision. Without a rate the whole amount is principal.
pub fn split_payment(balance: Decimal, rate: Option<Decimal>, amount: Decimal) -> Split {
    let Some(rate) = rate.filter(|r| !r.is_zero()) else {
        return Split {
            principal: amount,
            interest: Decimal::ZERO,
        };
    };
    let interest_due = balance * rate / Decimal::from(1200);
    if amount <= interest_due {
        Split {
            principal: Decimal::ZERO,
            interest: amount,
        }
    } else {
        Split {
            principal: amount - interest_due,
            interest: interest_due,
        }
    }
}

fn loan_from_row(r: &Row) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        lender: r.get(3)?,
        initial_principal: decimal_col(r, 4)?,
        current_balance: decimal_col(r, 5)?,
        interest_rate: opt_decimal_col(r, 6)?,
        monthly_payment: decimal_col(r, 7)?,
        due_day: r.get(8)?,
        start_date: date_col(r, 9)?,
        is_active: r.get(10)?,
        payment_history: Vec::new(),
    })
}

fn payments_for(conn: &Connection, loan_id: i64) -> Result<Vec<LoanPayment>> {
    let mut stmt = conn.prepare(
        "SELECT date, amount, principal_paid, interest_paid FROM loan_payments WHERE loan_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![loan_id], |r| {
        Ok(LoanPayment {
            date: ts_col(r, 0)?,
            amount: decimal_col(r, 1)?,
            principal_paid: decimal_col(r, 2)?,
            interest_paid: decimal_col(r, 3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn load(conn: &Connection, session: &Session, id: i64) -> Result<Loan> {
    session.user_id()?;
    let sql = format!("SELECT {} FROM loans WHERE id=?1", COLS);
    let mut loan = conn
        .query_row(&sql, params![id], loan_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found(ENTITY, id))?;
    session.check_owner(&loan.user_id, ENTITY, id)?;
    loan.payment_history = payments_for(conn, id)?;
    Ok(loan)
}

fn validate_due_day(day: u32) -> Result<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(Error::InvalidDueDate(day))
    }
}

/// New loans start active with the full principal outstanding.
pub fn create_loan(conn: &Connection, session: &Session, new: NewLoan) -> Result<Loan> {
    let user = session.user_id()?;
    if new.initial_principal <= Decimal::ZERO {
        return Err(Error::InvalidAmount(new.initial_principal));
    }
    if new.monthly_payment < Decimal::ZERO {
        return Err(Error::InvalidAmount(new.monthly_payment));
    }
    validate_due_day(new.due_day)?;
    let now = ts_sql(&Utc::now());
    conn.execute(
        "INSERT INTO loans(user_id, name, lender, initial_principal, current_balance, interest_rate, monthly_payment, due_day, start_date, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
        params![
            user,
            new.name.trim(),
            new.lender.trim(),
            new.initial_principal.to_string(),
            new.interest_rate.map(|r| r.to_string()),
            new.monthly_payment.to_string(),
            new.due_day,
            date_sql(&new.start_date),
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(user, id, "loan created");
    load(conn, session, id)
}

pub fn get_loan(conn: &Connection, session: &Session, id: i64) -> Result<Loan> {
    load(conn, session, id)
}

/// Active loans ordered by due day.
pub fn list_loans(conn: &Connection, session: &Session) -> Result<Vec<Loan>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM loans WHERE user_id=?1 AND is_active=1 ORDER BY due_day, id",
        COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], loan_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        let mut loan = row?;
        loan.payment_history = payments_for(conn, loan.id)?;
        out.push(loan);
    }
    Ok(out)
}

pub fn payment_history(conn: &Connection, session: &Session, id: i64) -> Result<Vec<LoanPayment>> {
    Ok(load(conn, session, id)?.payment_history)
}

/// Pays `amount` toward a loan from the wallet. The wallet debit, the balance
/// reduction and the history entry commit together or not at all.
pub fn make_payment(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    amount: Decimal,
    allow_negative_balance: bool,
) -> Result<LoanPayment> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    let tx = conn.transaction()?;
    let loan = load(&tx, session, id)?;
    let split = split_payment(loan.current_balance, loan.interest_rate, amount);

    let txn = wallet::post(
        &tx,
        session,
        Posting::new(
            -amount,
            TransactionKind::LoanPayment,
            format!("Loan Payment - {}", loan.name),
            LOAN_CATEGORY,
        )
        .related_to(id)
        .allow_negative(allow_negative_balance),
    )?;

    let payment = LoanPayment {
        date: txn.date,
        amount,
        principal_paid: split.principal,
        interest_paid: split.interest,
    };
    let new_balance = loan.current_balance - split.principal;
    tx.execute(
        "UPDATE loans SET current_balance=?1, updated_at=?2 WHERE id=?3",
        params![new_balance.to_string(), ts_sql(&payment.date), id],
    )?;
    tx.execute(
        "INSERT INTO loan_payments(loan_id, date, amount, principal_paid, interest_paid) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            ts_sql(&payment.date),
            payment.amount.to_string(),
            payment.principal_paid.to_string(),
            payment.interest_paid.to_string(),
        ],
    )?;
    tx.commit()?;
    tracing::info!(
        user = %txn.user_id,
        loan = id,
        principal = %split.principal,
        interest = %split.interest,
        remaining = %new_balance,
        "loan payment applied"
    );
    Ok(payment)
}

pub fn update_loan(conn: &Connection, session: &Session, id: i64, patch: LoanPatch) -> Result<Loan> {
    let mut loan = load(conn, session, id)?;
    if let Some(name) = patch.name {
        loan.name = name.trim().to_string();
    }
    if let Some(lender) = patch.lender {
        loan.lender = lender.trim().to_string();
    }
    if let Some(rate) = patch.interest_rate {
        loan.interest_rate = Some(rate);
    }
    if let Some(payment) = patch.monthly_payment {
        if payment < Decimal::ZERO {
            return Err(Error::InvalidAmount(payment));
        }
        loan.monthly_payment = payment;
    }
    if let Some(day) = patch.due_day {
        validate_due_day(day)?;
        loan.due_day = day;
    }
    if let Some(active) = patch.is_active {
        loan.is_active = active;
    }
    conn.execute(
        "UPDATE loans SET name=?1, lender=?2, interest_rate=?3, monthly_payment=?4, due_day=?5, is_active=?6, updated_at=?7 WHERE id=?8",
        params![
            loan.name,
            loan.lender,
            loan.interest_rate.map(|r| r.to_string()),
            loan.monthly_payment.to_string(),
            loan.due_day,
            loan.is_active,
            ts_sql(&Utc::now()),
            id,
        ],
    )?;
    Ok(loan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn split_with_interest() {
        let s = split_payment(dec("1000"), Some(dec("12")), dec("50"));
        assert_eq!(s.interest, dec("10"));
        assert_eq!(s.principal, dec("40"));
    }

    #[test]
    fn payment_below_interest_is_all_interest() {
        let s = split_payment(dec("1000"), Some(dec("12")), dec("7.50"));
        assert_eq!(s.interest, dec("7.50"));
        assert!(s.principal.is_zero());
    }

    #[test]
    fn no_rate_is_all_principal() {
        let s = split_payment(dec("1000"), None, dec("50"));
        assert_eq!(s.principal, dec("50"));
        assert!(s.interest.is_zero());
    }

    #[test]
    fn interest_due_is_not_rounded() {
        // 1234.56 * 0.05 / 12 = 5.144
        let s = split_payment(dec("1234.56"), Some(dec("5")), dec("100"));
        assert_eq!(s.interest, dec("5.144"));
        assert_eq!(s.principal, dec("94.856"));
    }
}
