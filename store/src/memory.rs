//! In-memory account store.

use crate::account::{Account, AccountStore, PodOperator};
use crate::StoreError;
use mooring_types::AccountId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Account store backed by a process-local map. Used in tests and
/// short-lived tooling; nothing survives a restart.
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    pod_operator: PodOperator,
}

impl MemoryAccountStore {
    pub fn new(pod_operator: PodOperator) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            pod_operator,
        }
    }
}

impl AccountStore for MemoryAccountStore {
    fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Backend("account map lock poisoned".into()))?;

        if accounts.contains_key(account.identity()) {
            return Err(StoreError::Duplicate(account.identity().to_string()));
        }

        accounts.insert(*account.identity(), account.clone());
        Ok(())
    }

    fn account(&self, identity: &AccountId) -> Result<Account, StoreError> {
        self.accounts
            .read()
            .map_err(|_| StoreError::Backend("account map lock poisoned".into()))?
            .get(identity)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))
    }

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .accounts
            .read()
            .map_err(|_| StoreError::Backend("account map lock poisoned".into()))?
            .values()
            .cloned()
            .collect())
    }

    fn pod_operator(&self) -> Result<PodOperator, StoreError> {
        Ok(self.pod_operator.clone())
    }
}
