// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// Instant at which something happened. Calendar-only values use `NaiveDate`.
pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    LoanPayment,
    CreditCardPayment,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::LoanPayment => "loan_payment",
            TransactionKind::CreditCardPayment => "credit_card_payment",
            TransactionKind::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "loan_payment" => Ok(TransactionKind::LoanPayment),
            "credit_card_payment" => Ok(TransactionKind::CreditCardPayment),
            "adjustment" => Ok(TransactionKind::Adjustment),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: String,
    pub current_balance: Decimal,
    /// Balance just before the most recent change.
    pub previous_balance: Decimal,
    pub last_updated: Timestamp,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub related_entity_id: Option<i64>,
    pub date: Timestamp,
    pub balance_after: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    pub paid_date: Option<Timestamp>,
    pub is_recurring: bool,
    pub recurring_day: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    pub due_date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_day: Option<u32>,
}

/// Fields left as `None` keep their stored value. Optional columns take
/// `Some(None)` to clear them.
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurring_day: Option<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub date: Timestamp,
    pub amount: Decimal,
    pub principal_paid: Decimal,
    pub interest_paid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub lender: String,
    pub initial_principal: Decimal,
    pub current_balance: Decimal,
    /// Annual percentage rate, e.g. `12` for 12%.
    pub interest_rate: Option<Decimal>,
    pub monthly_payment: Decimal,
    pub due_day: u32,
    pub start_date: NaiveDate,
    pub is_active: bool,
    pub payment_history: Vec<LoanPayment>,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub name: String,
    pub lender: String,
    pub initial_principal: Decimal,
    pub interest_rate: Option<Decimal>,
    pub monthly_payment: Decimal,
    pub due_day: u32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct LoanPatch {
    pub name: Option<String>,
    pub lender: Option<String>,
    pub interest_rate: Option<Decimal>,
    pub monthly_payment: Option<Decimal>,
    pub due_day: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayment {
    pub date: Timestamp,
    pub amount: Decimal,
    pub statement_period_start: Timestamp,
    pub statement_period_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub statement_balance: Decimal,
    pub due_day: u32,
    pub minimum_payment: Option<Decimal>,
    pub allow_overpayment: bool,
    pub is_active: bool,
    pub last_statement_date: Timestamp,
    pub next_statement_date: NaiveDate,
    pub payment_history: Vec<CardPayment>,
}

#[derive(Debug, Clone)]
pub struct NewCreditCard {
    pub name: String,
    pub statement_balance: Decimal,
    pub due_date: NaiveDate,
    pub minimum_payment: Option<Decimal>,
    pub allow_overpayment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringIncome {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub schedule: Schedule,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_scheduled_date: NaiveDate,
    pub last_processed: Option<Timestamp>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewRecurringIncome {
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub schedule: Schedule,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct RecurringIncomePatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<Option<String>>,
    pub schedule: Option<Schedule>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}
