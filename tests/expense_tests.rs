// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use walletwise::ledger::{expenses, wallet};
use walletwise::models::{ExpensePatch, NewExpense, TransactionKind};
use walletwise::{Error, Session, db};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup(opening: &str) -> (Connection, Session) {
    let mut conn = db::open_in_memory().unwrap();
    let s = Session::new("alice");
    wallet::create_wallet(&mut conn, &s, dec(opening)).unwrap();
    (conn, s)
}

fn rent(amount: &str) -> NewExpense {
    NewExpense {
        name: "Rent".into(),
        description: None,
        amount: dec(amount),
        category: "housing".into(),
        due_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        is_recurring: true,
        recurring_day: Some(1),
    }
}

fn balance(conn: &Connection, s: &Session) -> Decimal {
    wallet::get_wallet(conn, s).unwrap().unwrap().current_balance
}

#[test]
fn pay_then_unpay_round_trips_balance_not_history() {
    let (mut conn, s) = setup("200");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    assert!(!e.is_paid);

    let paid = expenses::mark_paid(&mut conn, &s, e.id, false).unwrap();
    assert_eq!(paid.kind, TransactionKind::Expense);
    assert_eq!(paid.description, "Expense Payment - Rent");
    assert_eq!(paid.category, "housing");
    assert_eq!(paid.related_entity_id, Some(e.id));
    assert_eq!(balance(&conn, &s), dec("125"));
    let stored = expenses::get_expense(&conn, &s, e.id).unwrap();
    assert!(stored.is_paid);
    assert!(stored.paid_date.is_some());

    let reversed = expenses::mark_unpaid(&mut conn, &s, e.id).unwrap();
    assert_eq!(reversed.kind, TransactionKind::Adjustment);
    assert_eq!(reversed.amount, dec("75"));
    assert_eq!(balance(&conn, &s), dec("200"));
    let stored = expenses::get_expense(&conn, &s, e.id).unwrap();
    assert!(!stored.is_paid);
    assert!(stored.paid_date.is_none());

    // opening balance + debit + reversal
    assert_eq!(wallet::all_transactions(&conn, &s).unwrap().len(), 3);
}

#[test]
fn state_transitions_are_checked() {
    let (mut conn, s) = setup("200");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    assert!(matches!(
        expenses::mark_unpaid(&mut conn, &s, e.id),
        Err(Error::AlreadyUnpaid)
    ));
    expenses::mark_paid(&mut conn, &s, e.id, false).unwrap();
    assert!(matches!(
        expenses::mark_paid(&mut conn, &s, e.id, false),
        Err(Error::AlreadyPaid)
    ));
}

#[test]
fn insufficient_funds_leaves_expense_unpaid() {
    let (mut conn, s) = setup("50");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    let err = expenses::mark_paid(&mut conn, &s, e.id, false).unwrap_err();
    assert!(err.is_insufficient_funds());
    assert!(!expenses::get_expense(&conn, &s, e.id).unwrap().is_paid);
    assert_eq!(balance(&conn, &s), dec("50"));
    assert_eq!(wallet::all_transactions(&conn, &s).unwrap().len(), 1);

    let txn = expenses::mark_paid(&mut conn, &s, e.id, true).unwrap();
    assert_eq!(txn.balance_after, dec("-25"));
}

#[test]
fn unpaid_reversal_is_allowed_while_negative() {
    let (mut conn, s) = setup("0");
    let big = expenses::create_expense(&conn, &s, rent("100")).unwrap();
    let small = expenses::create_expense(&conn, &s, rent("10")).unwrap();
    expenses::mark_paid(&mut conn, &s, big.id, true).unwrap();
    expenses::mark_paid(&mut conn, &s, small.id, true).unwrap();
    let txn = expenses::mark_unpaid(&mut conn, &s, small.id).unwrap();
    assert_eq!(txn.balance_after, dec("-100"));
}

#[test]
fn paid_expenses_cannot_be_changed() {
    let (mut conn, s) = setup("200");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    expenses::mark_paid(&mut conn, &s, e.id, false).unwrap();
    assert!(matches!(
        expenses::delete_expense(&conn, &s, e.id),
        Err(Error::CannotModifyPaid { action: "delete" })
    ));
    let patch = ExpensePatch {
        amount: Some(dec("80")),
        ..Default::default()
    };
    assert!(matches!(
        expenses::update_expense(&conn, &s, e.id, patch),
        Err(Error::CannotModifyPaid { action: "update" })
    ));
}

#[test]
fn unpaid_expense_can_be_updated_and_deleted() {
    let (conn, s) = setup("200");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    let updated = expenses::update_expense(
        &conn,
        &s,
        e.id,
        ExpensePatch {
            name: Some("Rent (March)".into()),
            amount: Some(dec("80")),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.amount, dec("80"));
    assert_eq!(
        expenses::get_expense(&conn, &s, e.id).unwrap().name,
        "Rent (March)"
    );

    expenses::delete_expense(&conn, &s, e.id).unwrap();
    assert!(expenses::get_expense(&conn, &s, e.id).unwrap_err().is_not_found());
}

#[test]
fn patch_can_clear_optional_fields() {
    let (conn, s) = setup("200");
    let mut new = rent("75");
    new.description = Some("flat 4B".into());
    let e = expenses::create_expense(&conn, &s, new).unwrap();

    // A `None` patch field keeps the stored value.
    let kept = expenses::update_expense(&conn, &s, e.id, ExpensePatch::default()).unwrap();
    assert_eq!(kept.description.as_deref(), Some("flat 4B"));
    assert_eq!(kept.recurring_day, Some(1));

    expenses::update_expense(
        &conn,
        &s,
        e.id,
        ExpensePatch {
            description: Some(None),
            is_recurring: Some(false),
            recurring_day: Some(None),
            ..Default::default()
        },
    )
    .unwrap();
    let stored = expenses::get_expense(&conn, &s, e.id).unwrap();
    assert_eq!(stored.description, None);
    assert_eq!(stored.recurring_day, None);
    assert!(!stored.is_recurring);
}

#[test]
fn other_users_cannot_touch_expense() {
    let (mut conn, s) = setup("200");
    let e = expenses::create_expense(&conn, &s, rent("75")).unwrap();
    let mallory = Session::new("mallory");
    assert!(matches!(
        expenses::mark_paid(&mut conn, &mallory, e.id, true),
        Err(Error::Unauthorized { .. })
    ));
    assert!(matches!(
        expenses::delete_expense(&conn, &mallory, e.id),
        Err(Error::Unauthorized { .. })
    ));
    assert!(matches!(
        expenses::mark_paid(&mut conn, &s, 9999, false),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn validation() {
    let (conn, s) = setup("0");
    let mut bad_day = rent("10");
    bad_day.recurring_day = Some(32);
    assert!(matches!(
        expenses::create_expense(&conn, &s, bad_day),
        Err(Error::InvalidDueDate(32))
    ));
    assert!(matches!(
        expenses::create_expense(&conn, &s, rent("0")),
        Err(Error::InvalidAmount(_))
    ));
}

#[test]
fn list_orders_by_due_date() {
    let (conn, s) = setup("0");
    let mut later = rent("10");
    later.name = "Later".into();
    later.due_date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    expenses::create_expense(&conn, &s, later).unwrap();
    expenses::create_expense(&conn, &s, rent("20")).unwrap();
    let names: Vec<_> = expenses::list_expenses(&conn, &s)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Rent", "Later"]);
}
