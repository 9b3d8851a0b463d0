// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by every ledger operation.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("User must be authenticated")]
    Unauthenticated,

    #[error("Unauthorized access to {entity} {id}")]
    Unauthorized { entity: &'static str, id: i64 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Applying the change would take the wallet below zero and no override was given.
    #[error("Insufficient funds: balance {balance}, change {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("Expense is already paid")]
    AlreadyPaid,

    #[error("Expense is already unpaid")]
    AlreadyUnpaid,

    #[error(
        "Payment amount {amount} exceeds statement balance {statement_balance} and overpayment is not allowed"
    )]
    PaymentExceedsBalance {
        statement_balance: Decimal,
        amount: Decimal,
    },

    #[error("Due date must be between 1 and 31, got {0}")]
    InvalidDueDate(u32),

    #[error("Invalid amount {0}")]
    InvalidAmount(Decimal),

    #[error("Cannot {action} a paid expense")]
    CannotModifyPaid { action: &'static str },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn unauthorized(entity: &'static str, id: i64) -> Self {
        Self::Unauthorized { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
