use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::{
    error::{ErrorKind, ResultExt, WalletError},
    wallet::{Version, Wallet, WalletId},
};

use super::WalletStore;

/// Process-local store with the same compare-and-swap contract as
/// [`PgWalletStore`](super::PgWalletStore).
///
/// A single lock covers all wallets, so operations on different wallets
/// briefly contend. Meant for development and tests, not production load.
#[derive(Default)]
pub struct InMemoryWalletStore {
    wallets: Mutex<HashMap<WalletId, Wallet>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a wallet unless one with the same id already exists.
    /// Returns whether a row was created.
    pub async fn provision(&self, wallet_id: WalletId, balance: Decimal) -> bool {
        let mut wallets = self.wallets.lock().await;
        if wallets.contains_key(&wallet_id) {
            return false;
        }
        wallets.insert(wallet_id, Wallet::new(wallet_id, balance));
        true
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn fetch(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.wallets
            .lock()
            .await
            .get(&wallet_id)
            .cloned()
            .ok_or(ErrorKind::NotFound { wallet_id })
            .within("fetch")
    }

    async fn persist(
        &self,
        wallet_id: WalletId,
        new_balance: Decimal,
        expected_version: Version,
    ) -> Result<Wallet, WalletError> {
        let mut wallets = self.wallets.lock().await;
        let wallet = wallets
            .get_mut(&wallet_id)
            .ok_or(ErrorKind::NotFound { wallet_id })
            .within("persist")?;
        if wallet.version != expected_version {
            return Err(ErrorKind::Conflict { wallet_id }).within("persist");
        }
        wallet.balance = new_balance;
        wallet.version += 1;
        Ok(wallet.clone())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn fetch_unknown_wallet() {
        let store = InMemoryWalletStore::new();
        let err = store.fetch(99).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "fetch: wallet 99 not found");
    }

    #[tokio::test]
    async fn provision_does_not_overwrite() {
        let store = InMemoryWalletStore::new();
        assert!(store.provision(1, dec!(100)).await);
        assert!(!store.provision(1, dec!(5)).await);
        assert_eq!(store.fetch(1).await.unwrap().balance, dec!(100));
    }

    #[tokio::test]
    async fn persist_bumps_version() {
        let store = InMemoryWalletStore::new();
        store.provision(1, dec!(100)).await;

        let updated = store.persist(1, dec!(70), 0).await.unwrap();
        assert_eq!(
            updated,
            Wallet {
                id: 1,
                balance: dec!(70),
                version: 1
            }
        );
        assert_eq!(store.fetch(1).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryWalletStore::new();
        store.provision(1, dec!(100)).await;
        store.persist(1, dec!(70), 0).await.unwrap();

        // a second writer still holding version 0 must not clobber the first
        let err = store.persist(1, dec!(90), 0).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.fetch(1).await.unwrap().balance, dec!(70));
    }

    #[tokio::test]
    async fn persist_unknown_wallet() {
        let store = InMemoryWalletStore::new();
        let err = store.persist(3, dec!(1), 0).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
