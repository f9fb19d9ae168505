use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    config::{ConfigError, DEFAULT_MAX_ATTEMPTS},
    error::{ErrorKind, ResultExt, WalletError},
    repository::{GetBalance, UpdateBalance},
    wallet::{Wallet, WalletId},
};

/// What callers outside the core get to do with a wallet.
#[async_trait]
pub trait WalletOperations: Send + Sync {
    async fn wallet_balance(&self, wallet_id: WalletId) -> Result<Wallet, WalletError>;

    /// Takes `amount` out of the wallet.
    async fn credit_wallet(&self, wallet_id: WalletId, amount: Decimal)
    -> Result<Wallet, WalletError>;

    /// Pays `amount` into the wallet.
    async fn debit_wallet(&self, wallet_id: WalletId, amount: Decimal)
    -> Result<Wallet, WalletError>;
}

pub struct BalanceService {
    get: Arc<dyn GetBalance>,
    update: Arc<dyn UpdateBalance>,
    max_attempts: u32,
}

pub struct BalanceServiceBuilder {
    get: Option<Arc<dyn GetBalance>>,
    update: Option<Arc<dyn UpdateBalance>>,
    max_attempts: u32,
}

impl BalanceService {
    pub fn builder() -> BalanceServiceBuilder {
        BalanceServiceBuilder {
            get: None,
            update: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Read, compute the candidate balance, then write it guarded by the
    /// version that was read. A lost race re-runs the whole sequence, so the
    /// balance check always applies to the value actually being replaced.
    async fn mutate<F>(&self, wallet_id: WalletId, apply: F) -> Result<Wallet, WalletError>
    where
        F: Fn(&Wallet) -> Result<Decimal, ErrorKind> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let wallet = self.get.get_balance(wallet_id).await?;
            let candidate = apply(&wallet)?;
            match self.update.update_balance(Some(&wallet), candidate).await {
                Err(err) if err.is_conflict() && attempt < self.max_attempts => {
                    debug!(wallet_id, attempt, "write conflict, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl BalanceServiceBuilder {
    pub fn get(mut self, get: Arc<dyn GetBalance>) -> Self {
        self.get = Some(get);
        self
    }

    pub fn update(mut self, update: Arc<dyn UpdateBalance>) -> Self {
        self.update = Some(update);
        self
    }

    /// Uses one repository for both capabilities.
    pub fn repository<R>(self, repository: Arc<R>) -> Self
    where
        R: GetBalance + UpdateBalance + 'static,
    {
        self.get(repository.clone()).update(repository)
    }

    /// Total attempts per mutation when writes keep conflicting.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn build(self) -> Result<BalanceService, ConfigError> {
        let get = self
            .get
            .ok_or(ConfigError::MissingDependency("get balance repository"))?;
        let update = self
            .update
            .ok_or(ConfigError::MissingDependency("update balance repository"))?;
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_attempts",
                value: self.max_attempts.to_string(),
                reason: "must be greater than zero",
            });
        }
        Ok(BalanceService {
            get,
            update,
            max_attempts: self.max_attempts,
        })
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<(), ErrorKind> {
    if amount < Decimal::ZERO {
        return Err(ErrorKind::InvalidInput(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(())
}

#[async_trait]
impl WalletOperations for BalanceService {
    async fn wallet_balance(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.get
            .get_balance(wallet_id)
            .await
            .within("wallet_balance")
    }

    async fn credit_wallet(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
    ) -> Result<Wallet, WalletError> {
        ensure_non_negative(amount).within("credit_wallet")?;
        self.mutate(wallet_id, |wallet| wallet.credited(amount))
            .await
            .within("credit_wallet")
    }

    async fn debit_wallet(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
    ) -> Result<Wallet, WalletError> {
        ensure_non_negative(amount).within("debit_wallet")?;
        self.mutate(wallet_id, |wallet| wallet.debited(amount))
            .await
            .within("debit_wallet")
    }
}
