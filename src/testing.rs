//! Accessor doubles that count calls and fail or stall on demand.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    cache::{InMemoryWalletCache, WalletCache},
    error::{ErrorKind, ResultExt, WalletError},
    store::{InMemoryWalletStore, WalletStore},
    wallet::{Version, Wallet, WalletId},
};

#[derive(Default)]
pub struct ProbeStore {
    pub inner: InMemoryWalletStore,
    pub fetches: AtomicUsize,
    pub persists: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub delay: Option<Duration>,
}

impl ProbeStore {
    pub async fn with_wallet(wallet_id: WalletId, balance: Decimal) -> Self {
        let store = Self::default();
        store.inner.provision(wallet_id, balance).await;
        store
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn persists(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl WalletStore for ProbeStore {
    async fn fetch(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.inner.fetch(wallet_id).await
    }

    async fn persist(
        &self,
        wallet_id: WalletId,
        new_balance: Decimal,
        expected_version: Version,
    ) -> Result<Wallet, WalletError> {
        self.persists.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            let err = io::Error::new(io::ErrorKind::BrokenPipe, "connection reset");
            return Err(ErrorKind::storage(err)).within("persist");
        }
        self.inner
            .persist(wallet_id, new_balance, expected_version)
            .await
    }
}

#[derive(Default)]
pub struct ProbeCache {
    pub inner: InMemoryWalletCache,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Holds back the first `put_cached` call only.
    pub first_put_delay: Option<Duration>,
}

impl ProbeCache {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

fn unreachable_backend() -> ErrorKind {
    ErrorKind::cache(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "cache unreachable",
    ))
}

#[async_trait]
impl WalletCache for ProbeCache {
    async fn get_cached(&self, wallet_id: WalletId) -> Result<Option<Wallet>, WalletError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unreachable_backend()).within("get_cached");
        }
        self.inner.get_cached(wallet_id).await
    }

    async fn put_cached(&self, wallet: &Wallet) -> Result<(), WalletError> {
        let earlier_puts = self.puts.fetch_add(1, Ordering::SeqCst);
        if let (0, Some(delay)) = (earlier_puts, self.first_put_delay) {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unreachable_backend()).within("put_cached");
        }
        self.inner.put_cached(wallet).await
    }
}
