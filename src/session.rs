// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};

/// Identity of the caller for a single request. Passed into every ledger
/// operation instead of being read from ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let trimmed = user_id.trim();
        Self {
            user_id: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_id(&self) -> Result<&str> {
        self.current_user_id().ok_or(Error::Unauthenticated)
    }

    /// Fails with `Unauthorized` unless `owner` is the session's user.
    pub fn check_owner(&self, owner: &str, entity: &'static str, id: i64) -> Result<()> {
        if self.user_id()? == owner {
            Ok(())
        } else {
            Err(Error::unauthorized(entity, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_is_anonymous() {
        let s = Session::new("   ");
        assert!(matches!(s.user_id(), Err(Error::Unauthenticated)));
    }

    #[test]
    fn owner_check() {
        let s = Session::new("alice");
        assert!(s.check_owner("alice", "Expense", 1).is_ok());
        assert!(matches!(
            s.check_owner("bob", "Expense", 1),
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            Session::anonymous().check_owner("bob", "Expense", 1),
            Err(Error::Unauthenticated)
        ));
    }
}
