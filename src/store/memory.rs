use crate::{
    core::{account::AccountId, ledger::LedgerState},
    errors::{Error, Result},
    store::{LedgerStore, check_revision},
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use tracing::debug;

/// Keeps every ledger in a `HashMap`. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledgers: Mutex<HashMap<AccountId, LedgerState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ledgers(&self) -> Result<MutexGuard<'_, HashMap<AccountId, LedgerState>>> {
        self.ledgers.lock().map_err(|e| Error::Persistence {
            message: format!("memory store lock poisoned: {e}"),
        })
    }
}

impl LedgerStore for MemoryStore {
    async fn load(&self, account: &AccountId) -> Result<Option<LedgerState>> {
        let state = self.ledgers()?.get(account).cloned();
        debug!(%account, found = state.is_some(), "Loaded ledger from memory");
        Ok(state)
    }

    async fn save(&self, account: &AccountId, state: &LedgerState) -> Result<()> {
        let mut ledgers = self.ledgers()?;
        check_revision(account, ledgers.get(account).map(|stored| stored.revision), state)?;
        ledgers.insert(account.clone(), state.committed());
        drop(ledgers);
        debug!(
            %account,
            transactions = state.transactions.len(),
            "Saved ledger to memory"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::cycle::Frequency;
    use crate::test_utils::date;

    #[tokio::test]
    async fn test_load_unknown_account_is_none() -> Result<()> {
        let store = MemoryStore::new();
        let account = AccountId::new("nobody")?;
        assert!(store.load(&account).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_returns_copy() -> Result<()> {
        let store = MemoryStore::new();
        let account = AccountId::new("ada")?;
        let state = LedgerState::new(Frequency::Weekly, date(2024, 1, 7));

        store.save(&account, &state).await?;
        let loaded = store.load(&account).await?.unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded, state.committed());

        Ok(())
    }

    #[tokio::test]
    async fn test_save_from_outdated_load_is_rejected() -> Result<()> {
        let store = MemoryStore::new();
        let account = AccountId::new("ada")?;
        store
            .save(&account, &LedgerState::new(Frequency::Weekly, date(2024, 1, 7)))
            .await?;

        let first = store.load(&account).await?.unwrap();
        let mut second = store.load(&account).await?.unwrap();
        store.save(&account, &first).await?;

        second.next_transaction_id = 9;
        let result = store.save(&account, &second).await;
        assert!(matches!(result, Err(Error::Persistence { .. })));

        let stored = store.load(&account).await?.unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.next_transaction_id, 1);

        // A second ledger for an existing account is rejected too
        let reopened = LedgerState::new(Frequency::Monthly, date(2024, 1, 8));
        assert!(store.save(&account, &reopened).await.is_err());
        Ok(())
    }
}
