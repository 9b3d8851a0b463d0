// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Domain operations. Each takes the connection and the caller's session
//! explicitly; operations that move money run in a single SQLite transaction.

pub mod cards;
pub mod expenses;
pub mod income;
pub mod loans;
pub mod wallet;

pub use wallet::{Posting, debit_or_credit, recent_transactions, set_balance};
