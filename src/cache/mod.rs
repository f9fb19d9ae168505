//! Cache Accessor: a read/write accelerator in front of the durable store.
//!
//! The cache only ever mirrors what the durable store confirmed. A miss is
//! reported as `Ok(None)` and is never an error.

use async_trait::async_trait;

use crate::{
    error::{ErrorKind, WalletError},
    wallet::{Wallet, WalletId},
};

pub mod in_memory_cache;
pub mod redis_cache;

pub use in_memory_cache::InMemoryWalletCache;
pub use redis_cache::RedisWalletCache;

#[async_trait]
pub trait WalletCache: Send + Sync {
    async fn get_cached(&self, wallet_id: WalletId) -> Result<Option<Wallet>, WalletError>;

    /// Stores `wallet` under its id with no expiration.
    async fn put_cached(&self, wallet: &Wallet) -> Result<(), WalletError>;
}

/// Entries are keyed by the decimal string form of the wallet id.
pub fn cache_key(wallet_id: WalletId) -> String {
    wallet_id.to_string()
}

pub(crate) fn encode(wallet: &Wallet) -> Result<String, ErrorKind> {
    serde_json::to_string(wallet).map_err(ErrorKind::Serialization)
}

pub(crate) fn decode(raw: &str) -> Result<Wallet, ErrorKind> {
    serde_json::from_str(raw).map_err(ErrorKind::Serialization)
}
