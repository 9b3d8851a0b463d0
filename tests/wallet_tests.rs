// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use walletwise::ledger::{self, Posting, wallet};
use walletwise::models::TransactionKind;
use walletwise::{Error, Session, db};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (Connection, Session) {
    (db::open_in_memory().unwrap(), Session::new("alice"))
}

fn balance(conn: &Connection, session: &Session) -> Decimal {
    wallet::get_wallet(conn, session)
        .unwrap()
        .map(|w| w.current_balance)
        .unwrap_or_default()
}

fn txn_count(conn: &Connection, session: &Session) -> usize {
    wallet::all_transactions(conn, session).unwrap().len()
}

#[test]
fn balance_matches_last_transaction_after_every_change() {
    let (mut conn, s) = setup();
    let postings = [
        Posting::new(dec("120.50"), TransactionKind::Income, "Pay", "Salary"),
        Posting::new(dec("-20.25"), TransactionKind::Expense, "Lunch", "Food"),
        Posting::new(dec("-5"), TransactionKind::Adjustment, "Fix", "Adjustment"),
    ];
    for p in postings {
        ledger::debit_or_credit(&mut conn, &s, p).unwrap();
        let last = ledger::recent_transactions(&conn, &s, 1).unwrap();
        assert_eq!(balance(&conn, &s), last[0].balance_after);
    }
    assert_eq!(balance(&conn, &s), dec("95.25"));
}

#[test]
fn negative_income_is_credited() {
    let (mut conn, s) = setup();
    let txn = ledger::debit_or_credit(
        &mut conn,
        &s,
        Posting::new(dec("-50"), TransactionKind::Income, "Gift", "Income"),
    )
    .unwrap();
    assert_eq!(txn.amount, dec("50"));
    assert_eq!(txn.balance_after, dec("50"));
    assert_eq!(balance(&conn, &s), dec("50"));
}

#[test]
fn overdraft_is_refused_without_override() {
    let (mut conn, s) = setup();
    ledger::set_balance(&mut conn, &s, dec("100"), "start").unwrap();
    let before = txn_count(&conn, &s);

    let err = ledger::debit_or_credit(
        &mut conn,
        &s,
        Posting::new(dec("-150"), TransactionKind::Expense, "TV", "Shopping"),
    )
    .unwrap_err();
    assert!(err.is_insufficient_funds());
    assert_eq!(balance(&conn, &s), dec("100"));
    assert_eq!(txn_count(&conn, &s), before);
}

#[test]
fn overdraft_with_override_goes_negative() {
    let (mut conn, s) = setup();
    ledger::set_balance(&mut conn, &s, dec("100"), "start").unwrap();
    let before = txn_count(&conn, &s);

    let txn = ledger::debit_or_credit(
        &mut conn,
        &s,
        Posting::new(dec("-150"), TransactionKind::Expense, "TV", "Shopping").allow_negative(true),
    )
    .unwrap();
    assert_eq!(txn.balance_after, dec("-50"));
    assert_eq!(balance(&conn, &s), dec("-50"));
    assert_eq!(txn_count(&conn, &s), before + 1);
}

#[test]
fn set_balance_records_absolute_difference() {
    let (mut conn, s) = setup();
    ledger::set_balance(&mut conn, &s, dec("100"), "start").unwrap();
    let txn = ledger::set_balance(&mut conn, &s, dec("40"), "recount").unwrap();
    assert_eq!(txn.amount, dec("60"));
    assert_eq!(txn.kind, TransactionKind::Expense);
    assert_eq!(txn.category, wallet::ADJUSTMENT_CATEGORY);
    assert_eq!(txn.description, "Manual balance adjustment: recount");

    let w = wallet::get_wallet(&conn, &s).unwrap().unwrap();
    assert_eq!(w.previous_balance, dec("100"));
    assert_eq!(w.current_balance, dec("40"));

    // Manual override may go below zero.
    let txn = ledger::set_balance(&mut conn, &s, dec("-10"), "oops").unwrap();
    assert_eq!(txn.balance_after, dec("-10"));
}

#[test]
fn recent_transactions_newest_first() {
    let (mut conn, s) = setup();
    for i in 1..=4 {
        ledger::debit_or_credit(
            &mut conn,
            &s,
            Posting::new(Decimal::from(i), TransactionKind::Income, format!("#{}", i), "Income"),
        )
        .unwrap();
    }
    let recent = ledger::recent_transactions(&conn, &s, 2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].description, "#4");
    assert_eq!(recent[1].description, "#3");
}

#[test]
fn opening_balance_is_logged_once() {
    let (mut conn, s) = setup();
    let w = wallet::create_wallet(&mut conn, &s, dec("250")).unwrap();
    assert_eq!(w.current_balance, dec("250"));
    let again = wallet::create_wallet(&mut conn, &s, dec("999")).unwrap();
    assert_eq!(again.current_balance, dec("250"));

    let txns = wallet::all_transactions(&conn, &s).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].kind, TransactionKind::Adjustment);
    assert_eq!(txns[0].balance_after, dec("250"));
}

#[test]
fn zero_change_is_rejected() {
    let (mut conn, s) = setup();
    let err = ledger::debit_or_credit(
        &mut conn,
        &s,
        Posting::new(Decimal::ZERO, TransactionKind::Expense, "Nothing", "Other"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidAmount(_)));
    assert_eq!(txn_count(&conn, &s), 0);
}

#[test]
fn anonymous_session_is_rejected() {
    let (mut conn, _) = setup();
    let err = ledger::debit_or_credit(
        &mut conn,
        &Session::anonymous(),
        Posting::new(dec("10"), TransactionKind::Income, "Pay", "Income"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
}

#[test]
fn wallets_are_per_user() {
    let (mut conn, alice) = setup();
    let bob = Session::new("bob");
    ledger::set_balance(&mut conn, &alice, dec("10"), "a").unwrap();
    ledger::set_balance(&mut conn, &bob, dec("20"), "b").unwrap();
    assert_eq!(balance(&conn, &alice), dec("10"));
    assert_eq!(balance(&conn, &bob), dec("20"));
    assert_eq!(ledger::recent_transactions(&conn, &alice, 10).unwrap().len(), 1);
}

#[test]
fn wallet_is_created_on_first_access() {
    let (conn, s) = setup();
    assert!(wallet::get_wallet(&conn, &s).unwrap().is_none());
    let w = wallet::ensure_wallet(&conn, &s).unwrap();
    assert!(w.current_balance.is_zero());
    assert_eq!(wallet::ensure_wallet(&conn, &s).unwrap().id, w.id);
    assert_eq!(txn_count(&conn, &s), 0);
}
