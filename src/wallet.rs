use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

pub type WalletId = i64;

/// Optimistic-concurrency stamp, bumped by every committed balance write.
pub type Version = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: Decimal,
    #[serde(default)]
    pub version: Version,
}

impl Wallet {
    pub fn new(id: WalletId, balance: Decimal) -> Self {
        Self {
            id,
            balance,
            version: 0,
        }
    }

    /// Balance after taking `amount` out of the wallet.
    ///
    /// In this domain a credit moves value from the wallet to the house, so the
    /// balance goes down and must stay non-negative.
    pub fn credited(&self, amount: Decimal) -> Result<Decimal, ErrorKind> {
        let candidate = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| ErrorKind::InvalidInput(format!("credit of {amount} overflows")))?;
        if candidate < Decimal::ZERO {
            return Err(ErrorKind::InsufficientFunds {
                balance: self.balance,
                amount,
            });
        }
        Ok(candidate)
    }

    /// Balance after paying `amount` into the wallet.
    pub fn debited(&self, amount: Decimal) -> Result<Decimal, ErrorKind> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| ErrorKind::InvalidInput(format!("debit of {amount} overflows")))
    }
}
