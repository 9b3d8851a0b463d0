// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The wallet balance and its append-only transaction log.
//!
//! Every balance change goes through [`post`], which updates the wallet row
//! and appends exactly one transaction carrying the resulting balance. Callers
//! that need a larger atomic unit (a loan payment plus its history row) run
//! `post` inside their own `rusqlite::Transaction`; [`debit_or_credit`] is the
//! standalone form that opens and commits one itself.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{Timestamp, Transaction, TransactionKind, Wallet};
use crate::session::Session;
use crate::utils::{decimal_col, ts_col, ts_sql};

pub const ADJUSTMENT_CATEGORY: &str = "Adjustment";

const WALLET_COLS: &str =
    "id, user_id, current_balance, previous_balance, last_updated, created_at";
const TXN_COLS: &str =
    "id, user_id, date, amount, kind, category, description, related_entity_id, balance_after";

/// One requested balance change.
#[derive(Debug, Clone)]
pub struct Posting {
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: String,
    pub category: String,
    pub related_entity_id: Option<i64>,
    pub allow_negative: bool,
}

impl Posting {
    pub fn new(
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            kind,
            description: description.into(),
            category: category.into(),
            related_entity_id: None,
            allow_negative: false,
        }
    }

    pub fn related_to(mut self, id: i64) -> Self {
        self.related_entity_id = Some(id);
        self
    }

    pub fn allow_negative(mut self, allow: bool) -> Self {
        self.allow_negative = allow;
        self
    }

    /// Income is always credited, whatever sign the caller passed.
    pub fn effective_delta(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount.abs(),
            _ => self.amount,
        }
    }
}

fn wallet_from_row(r: &Row) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        id: r.get(0)?,
        user_id: r.get(1)?,
        current_balance: decimal_col(r, 2)?,
        previous_balance: decimal_col(r, 3)?,
        last_updated: ts_col(r, 4)?,
        created_at: ts_col(r, 5)?,
    })
}

fn transaction_from_row(r: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = r.get(4)?;
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?;
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        date: ts_col(r, 2)?,
        amount: decimal_col(r, 3)?,
        kind,
        category: r.get(5)?,
        description: r.get(6)?,
        related_entity_id: r.get(7)?,
        balance_after: decimal_col(r, 8)?,
    })
}

pub fn get_wallet(conn: &Connection, session: &Session) -> Result<Option<Wallet>> {
    let user = session.user_id()?;
    let sql = format!("SELECT {} FROM wallets WHERE user_id=?1", WALLET_COLS);
    let wallet = conn
        .query_row(&sql, params![user], wallet_from_row)
        .optional()?;
    Ok(wallet)
}

/// Returns the caller's wallet, creating an empty one on first access.
pub fn ensure_wallet(conn: &Connection, session: &Session) -> Result<Wallet> {
    load_or_create(conn, session, Utc::now())
}

/// Opens a wallet with an opening balance. An opening balance other than zero
/// is recorded as an adjustment so the log and the balance agree from the
/// start. An existing wallet is returned unchanged.
pub fn create_wallet(
    conn: &mut Connection,
    session: &Session,
    initial_balance: Decimal,
) -> Result<Wallet> {
    let user = session.user_id()?.to_string();
    let tx = conn.transaction()?;
    if let Some(existing) = get_wallet(&tx, session)? {
        return Ok(existing);
    }
    let now = Utc::now();
    insert_wallet(&tx, &user, now)?;
    if !initial_balance.is_zero() {
        write_balance(&tx, &user, Decimal::ZERO, initial_balance, now)?;
        insert_transaction(
            &tx,
            &user,
            &Posting::new(
                initial_balance,
                TransactionKind::Adjustment,
                "Opening balance",
                ADJUSTMENT_CATEGORY,
            ),
            initial_balance,
            now,
        )?;
    }
    let wallet = get_wallet(&tx, session)?.ok_or_else(|| Error::not_found("Wallet", 0))?;
    tx.commit()?;
    tracing::info!(user = %user, balance = %wallet.current_balance, "wallet created");
    Ok(wallet)
}

fn insert_wallet(conn: &Connection, user: &str, now: Timestamp) -> Result<()> {
    conn.execute(
        "INSERT INTO wallets(user_id, current_balance, previous_balance, last_updated, created_at)
         VALUES (?1, '0', '0', ?2, ?2)
         ON CONFLICT(user_id) DO NOTHING",
        params![user, ts_sql(&now)],
    )?;
    Ok(())
}

fn load_or_create(conn: &Connection, session: &Session, now: Timestamp) -> Result<Wallet> {
    if let Some(wallet) = get_wallet(conn, session)? {
        return Ok(wallet);
    }
    let user = session.user_id()?;
    insert_wallet(conn, user, now)?;
    tracing::debug!(user, "wallet initialized on first access");
    get_wallet(conn, session)?.ok_or_else(|| Error::not_found("Wallet", 0))
}

fn write_balance(
    conn: &Connection,
    user: &str,
    previous: Decimal,
    current: Decimal,
    now: Timestamp,
) -> Result<()> {
    conn.execute(
        "UPDATE wallets SET previous_balance=?1, current_balance=?2, last_updated=?3 WHERE user_id=?4",
        params![previous.to_string(), current.to_string(), ts_sql(&now), user],
    )?;
    Ok(())
}

fn insert_transaction(
    conn: &Connection,
    user: &str,
    posting: &Posting,
    balance_after: Decimal,
    now: Timestamp,
) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions(user_id, date, amount, kind, category, description, related_entity_id, balance_after)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user,
            ts_sql(&now),
            posting.amount.to_string(),
            posting.kind.as_str(),
            posting.category,
            posting.description,
            posting.related_entity_id,
            balance_after.to_string(),
        ],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        user_id: user.to_string(),
        amount: posting.amount,
        kind: posting.kind,
        category: posting.category.clone(),
        description: posting.description.clone(),
        related_entity_id: posting.related_entity_id,
        date: now,
        balance_after,
    })
}

/// Applies `posting` to the wallet without opening a transaction of its own.
///
/// The caller must run this inside a `rusqlite::Transaction` and commit it;
/// on error nothing has been written yet that the caller's rollback would not
/// undo.
pub fn post(conn: &Connection, session: &Session, posting: Posting) -> Result<Transaction> {
    let user = session.user_id()?;
    let delta = posting.effective_delta();
    if delta.is_zero() {
        return Err(Error::InvalidAmount(posting.amount));
    }
    let now = Utc::now();
    let wallet = load_or_create(conn, session, now)?;
    let new_balance = wallet.current_balance + delta;
    if new_balance < Decimal::ZERO && !posting.allow_negative {
        tracing::warn!(
            user,
            balance = %wallet.current_balance,
            delta = %delta,
            "rejected: insufficient funds"
        );
        return Err(Error::InsufficientFunds {
            balance: wallet.current_balance,
            requested: delta,
        });
    }

    write_balance(conn, user, wallet.current_balance, new_balance, now)?;
    let recorded = Posting {
        amount: delta,
        ..posting
    };
    insert_transaction(conn, user, &recorded, new_balance, now)
}

/// Standalone balance change: one atomic unit of wallet update plus log entry.
pub fn debit_or_credit(
    conn: &mut Connection,
    session: &Session,
    posting: Posting,
) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let txn = post(&tx, session, posting)?;
    tx.commit()?;
    tracing::info!(
        user = %txn.user_id,
        kind = %txn.kind,
        amount = %txn.amount,
        balance = %txn.balance_after,
        "wallet updated"
    );
    Ok(txn)
}

/// Administrative override of the balance. Never checks for a negative result.
pub fn set_balance(
    conn: &mut Connection,
    session: &Session,
    new_balance: Decimal,
    reason: &str,
) -> Result<Transaction> {
    let user = session.user_id()?.to_string();
    let tx = conn.transaction()?;
    let now = Utc::now();
    let wallet = load_or_create(&tx, session, now)?;
    let difference = new_balance - wallet.current_balance;
    let kind = if difference < Decimal::ZERO {
        TransactionKind::Expense
    } else {
        TransactionKind::Income
    };

    write_balance(&tx, &user, wallet.current_balance, new_balance, now)?;
    let posting = Posting::new(
        difference.abs(),
        kind,
        format!("Manual balance adjustment: {}", reason.trim()),
        ADJUSTMENT_CATEGORY,
    );
    let txn = insert_transaction(&tx, &user, &posting, new_balance, now)?;
    tx.commit()?;
    tracing::info!(
        user = %user,
        previous = %wallet.current_balance,
        balance = %new_balance,
        "balance set manually"
    );
    Ok(txn)
}

/// The `n` most recent transactions, newest first. Entries sharing a
/// timestamp come back in reverse insertion order.
pub fn recent_transactions(
    conn: &Connection,
    session: &Session,
    n: usize,
) -> Result<Vec<Transaction>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?1 ORDER BY date DESC, id DESC LIMIT ?2",
        TXN_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user, n as i64], transaction_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    tracing::debug!(user, count = out.len(), "loaded recent transactions");
    Ok(out)
}

/// Full history in chronological order.
pub fn all_transactions(conn: &Connection, session: &Session) -> Result<Vec<Transaction>> {
    let user = session.user_id()?;
    let sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?1 ORDER BY date, id",
        TXN_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], transaction_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
