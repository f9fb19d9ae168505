use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    error::WalletError,
    service::WalletOperations,
    wallet::{Wallet, WalletId},
};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Balance,
    Credit,
    Debit,
}

/// A non-negative monetary amount, validated before it reaches the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(self) -> Decimal {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletCommand {
    Balance { wallet_id: WalletId },
    Credit { wallet_id: WalletId, amount: Amount },
    Debit { wallet_id: WalletId, amount: Amount },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletCommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: OperationKind },
    #[error("Amount must not be negative for {kind:?}")]
    NegativeAmount { kind: OperationKind },
}

impl WalletCommand {
    pub fn parse(
        kind: OperationKind,
        wallet_id: WalletId,
        amount: Option<Decimal>,
    ) -> Result<Self, WalletCommandError> {
        match kind {
            OperationKind::Balance => Ok(Self::Balance { wallet_id }),
            OperationKind::Credit => Ok(Self::Credit {
                wallet_id,
                amount: Self::parse_amount(kind, amount)?,
            }),
            OperationKind::Debit => Ok(Self::Debit {
                wallet_id,
                amount: Self::parse_amount(kind, amount)?,
            }),
        }
    }

    fn parse_amount(
        kind: OperationKind,
        amount: Option<Decimal>,
    ) -> Result<Amount, WalletCommandError> {
        let Some(amount) = amount else {
            return Err(WalletCommandError::AmountRequired { kind });
        };
        if amount < Decimal::ZERO {
            return Err(WalletCommandError::NegativeAmount { kind });
        }
        Ok(Amount(amount))
    }

    pub fn wallet_id(&self) -> WalletId {
        match *self {
            Self::Balance { wallet_id }
            | Self::Credit { wallet_id, .. }
            | Self::Debit { wallet_id, .. } => wallet_id,
        }
    }

    pub async fn execute<P>(self, wallets: &P) -> Result<Wallet, WalletError>
    where
        P: WalletOperations + ?Sized,
    {
        match self {
            Self::Balance { wallet_id } => wallets.wallet_balance(wallet_id).await,
            Self::Credit { wallet_id, amount } => {
                wallets.credit_wallet(wallet_id, amount.value()).await
            }
            Self::Debit { wallet_id, amount } => {
                wallets.debit_wallet(wallet_id, amount.value()).await
            }
        }
    }
}
