use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{ResultExt, WalletError},
    wallet::{Wallet, WalletId},
};

use super::{WalletCache, cache_key, decode, encode};

/// Process-local cache that keeps entries serialized, the same way the Redis
/// backend does, so decoding failures surface identically.
///
/// One lock guards every entry, so calls on different wallets serialize for
/// the length of a map access. Meant for development and tests; production
/// runs use [`RedisWalletCache`](super::RedisWalletCache).
#[derive(Default)]
pub struct InMemoryWalletCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryWalletCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw value under `key`, bypassing encoding.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().await.insert(key.into(), value.into());
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl WalletCache for InMemoryWalletCache {
    async fn get_cached(&self, wallet_id: WalletId) -> Result<Option<Wallet>, WalletError> {
        let entries = self.entries.lock().await;
        entries
            .get(&cache_key(wallet_id))
            .map(|raw| decode(raw))
            .transpose()
            .within("get_cached")
    }

    async fn put_cached(&self, wallet: &Wallet) -> Result<(), WalletError> {
        let payload = encode(wallet).within("put_cached")?;
        let key = cache_key(wallet.id);
        let mut entries = self.entries.lock().await;
        // Never step back to an older version; unreadable entries are replaced.
        if let Some(current) = entries.get(&key).and_then(|raw| decode(raw).ok()) {
            if current.version >= wallet.version {
                return Ok(());
            }
        }
        entries.insert(key, payload);
        Ok(())
    }
}
