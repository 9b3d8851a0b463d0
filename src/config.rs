// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user preferences kept in the `preferences` table.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::session::Session;

const ALLOW_NEGATIVE: &str = "allow_negative_balance";
const CARD_OVERPAYMENT: &str = "card_overpayment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverpaymentPolicy {
    Allow,
    Cap,
}

impl OverpaymentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverpaymentPolicy::Allow => "allow",
            OverpaymentPolicy::Cap => "cap",
        }
    }
}

impl fmt::Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverpaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(OverpaymentPolicy::Allow),
            "cap" => Ok(OverpaymentPolicy::Cap),
            other => Err(format!("unknown overpayment policy '{}' (use allow|cap)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    /// Default for the negative-balance override when a command does not say.
    pub allow_negative_balance: bool,
    /// Default `allow_overpayment` for newly created cards.
    pub card_overpayment: OverpaymentPolicy,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            allow_negative_balance: false,
            card_overpayment: OverpaymentPolicy::Cap,
        }
    }
}

impl Preferences {
    pub fn load(conn: &Connection, session: &Session) -> Result<Self> {
        let user = session.user_id()?;
        let mut prefs = Preferences::default();
        if let Some(v) = get_value(conn, user, ALLOW_NEGATIVE)? {
            prefs.allow_negative_balance = v == "true";
        }
        if let Some(v) = get_value(conn, user, CARD_OVERPAYMENT)? {
            match v.parse() {
                Ok(policy) => prefs.card_overpayment = policy,
                Err(msg) => tracing::warn!(user, %msg, "ignoring stored preference"),
            }
        }
        Ok(prefs)
    }

    pub fn save(&self, conn: &Connection, session: &Session) -> Result<()> {
        let user = session.user_id()?;
        set_value(
            conn,
            user,
            ALLOW_NEGATIVE,
            if self.allow_negative_balance { "true" } else { "false" },
        )?;
        set_value(conn, user, CARD_OVERPAYMENT, self.card_overpayment.as_str())?;
        Ok(())
    }
}

fn get_value(conn: &Connection, user: &str, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM preferences WHERE user_id=?1 AND key=?2",
        params![user, key],
        |r| r.get(0),
    )
    .optional()
    .map_err(Error::from)
}

fn set_value(conn: &Connection, user: &str, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences(user_id, key, value) VALUES(?1, ?2, ?3)
         ON CONFLICT(user_id, key) DO UPDATE SET value=excluded.value",
        params![user, key, value],
    )?;
    Ok(())
}
