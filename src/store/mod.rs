//! Durable Store Accessor: the authoritative copy of every wallet.
//!
//! Writes are compare-and-swap on [`Wallet::version`], so two writers that
//! read the same snapshot cannot both commit.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    error::WalletError,
    wallet::{Version, Wallet, WalletId},
};

pub mod in_memory_store;
pub mod postgres_store;

pub use in_memory_store::InMemoryWalletStore;
pub use postgres_store::PgWalletStore;

#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Fails with `NotFound` when no row exists for `wallet_id`.
    async fn fetch(&self, wallet_id: WalletId) -> Result<Wallet, WalletError>;

    /// Overwrites the balance if the stored version still equals
    /// `expected_version` and returns the committed row.
    ///
    /// Fails with `NotFound` when the row is absent and with `Conflict` when
    /// another write landed first.
    async fn persist(
        &self,
        wallet_id: WalletId,
        new_balance: Decimal,
        expected_version: Version,
    ) -> Result<Wallet, WalletError>;
}
