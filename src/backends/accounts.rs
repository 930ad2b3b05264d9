//! Account directory built from configuration.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use subtle::ConstantTimeEq;

use crate::backends::{CollaboratorError, GroupBackend, UserBackend};
use crate::config::AccountConfig;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    groups: HashSet<String>,
}

/// Static accounts and group memberships.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: HashMap<String, Account>,
}

impl AccountDirectory {
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let accounts = accounts
            .iter()
            .map(|a| {
                (
                    a.username.clone(),
                    Account {
                        password: a.password.clone(),
                        groups: a.groups.iter().cloned().collect(),
                    },
                )
            })
            .collect();
        Self { accounts }
    }

    /// Number of known accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl UserBackend for AccountDirectory {
    async fn check_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, CollaboratorError> {
        let Some(account) = self.accounts.get(username) else {
            return Ok(false);
        };
        Ok(account.password.as_bytes().ct_eq(password.as_bytes()).into())
    }

    async fn user_exists(&self, username: &str) -> Result<bool, CollaboratorError> {
        Ok(self.accounts.contains_key(username))
    }
}

#[async_trait]
impl GroupBackend for AccountDirectory {
    async fn in_group(&self, username: &str, group: &str) -> Result<bool, CollaboratorError> {
        Ok(self
            .accounts
            .get(username)
            .is_some_and(|a| a.groups.contains(group)))
    }
}
