use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    cache::WalletCache,
    error::{BoxError, ErrorKind, ResultExt, WalletError},
    store::WalletStore,
    wallet::{Wallet, WalletId},
};

#[async_trait]
pub trait GetBalance: Send + Sync {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Wallet, WalletError>;
}

#[async_trait]
pub trait UpdateBalance: Send + Sync {
    /// Persists `new_balance` for `wallet`, guarded by the version it was read at.
    async fn update_balance(
        &self,
        wallet: Option<&Wallet>,
        new_balance: Decimal,
    ) -> Result<Wallet, WalletError>;
}

/// Reads cache-aside and writes through: the durable store is written first,
/// then the committed row is mirrored into the cache.
pub struct WalletRepository {
    store: Arc<dyn WalletStore>,
    cache: Arc<dyn WalletCache>,
    timeout: Option<Duration>,
}

impl WalletRepository {
    pub fn new(store: Arc<dyn WalletStore>, cache: Arc<dyn WalletCache>) -> Self {
        Self {
            store,
            cache,
            timeout: None,
        }
    }

    /// Bounds every individual store and cache call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, WalletError>>,
        on_elapsed: fn(BoxError) -> ErrorKind,
    ) -> Result<T, WalletError> {
        let Some(limit) = self.timeout else {
            return call.await;
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(elapsed) => Err(on_elapsed(Box::new(elapsed)).into()),
        }
    }

    async fn reload_cache(&self, wallet_id: WalletId) -> Result<(), WalletError> {
        let current = self
            .bounded(self.store.fetch(wallet_id), ErrorKind::Storage)
            .await?;
        self.bounded(self.cache.put_cached(&current), ErrorKind::Cache)
            .await
    }
}

#[async_trait]
impl GetBalance for WalletRepository {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        let cached = self
            .bounded(self.cache.get_cached(wallet_id), ErrorKind::Cache)
            .await
            .within("get_balance")?;
        if let Some(wallet) = cached {
            debug!(wallet_id, "cache hit");
            return Ok(wallet);
        }

        debug!(wallet_id, "cache miss, reading durable store");
        self.bounded(self.store.fetch(wallet_id), ErrorKind::Storage)
            .await
            .within("get_balance")
    }
}

#[async_trait]
impl UpdateBalance for WalletRepository {
    async fn update_balance(
        &self,
        wallet: Option<&Wallet>,
        new_balance: Decimal,
    ) -> Result<Wallet, WalletError> {
        let wallet = wallet
            .ok_or_else(|| ErrorKind::InvalidInput("no wallet supplied".to_owned()))
            .within("update_balance")?;

        let persisted = self
            .bounded(
                self.store.persist(wallet.id, new_balance, wallet.version),
                ErrorKind::Storage,
            )
            .await;
        let updated = match persisted {
            Ok(updated) => updated,
            Err(err) => {
                if err.is_conflict() {
                    // Let the next read see what actually won.
                    if let Err(reload_err) = self.reload_cache(wallet.id).await {
                        warn!(wallet_id = wallet.id, error = %reload_err, "failed to refresh cache after write conflict");
                    }
                }
                return Err(err.within("update_balance"));
            }
        };

        if let Err(err) = self
            .bounded(self.cache.put_cached(&updated), ErrorKind::Cache)
            .await
        {
            warn!(
                wallet_id = updated.id,
                balance = %updated.balance,
                version = updated.version,
                error = %err,
                "balance committed to durable store but cache write failed, cached value is stale"
            );
            return Err(err.within("update_balance"));
        }

        debug!(wallet_id = updated.id, balance = %updated.balance, "balance updated");
        Ok(updated)
    }
}
