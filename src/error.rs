//! Errors raised by the balance engine.
//!
//! [`ErrorKind`] says what went wrong; [`WalletError`] additionally records
//! every operation the failure travelled through on its way to the caller,
//! so `credit_wallet: update_balance: put_cached: cache failure: ...` reads
//! outermost first.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::wallet::WalletId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("wallet {wallet_id} not found")]
    NotFound { wallet_id: WalletId },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient funds: balance {balance} cannot cover {amount}")]
    InsufficientFunds { balance: Decimal, amount: Decimal },
    #[error("wallet {wallet_id} was modified concurrently")]
    Conflict { wallet_id: WalletId },
    #[error("storage failure: {0}")]
    Storage(#[source] BoxError),
    #[error("cache failure: {0}")]
    Cache(#[source] BoxError),
    #[error("serialization failure: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ErrorKind {
    pub fn storage(err: impl Into<BoxError>) -> Self {
        Self::Storage(err.into())
    }

    pub fn cache(err: impl Into<BoxError>) -> Self {
        Self::Cache(err.into())
    }
}

#[derive(Debug)]
pub struct WalletError {
    /// Innermost operation first.
    trail: Vec<&'static str>,
    kind: ErrorKind,
}

impl WalletError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Operation names, outermost first.
    pub fn operations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.trail.iter().rev().copied()
    }

    pub fn within(mut self, op: &'static str) -> Self {
        self.trail.push(op);
        self
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict { .. })
    }
}

impl From<ErrorKind> for WalletError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            trail: Vec::new(),
            kind,
        }
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in self.operations() {
            write!(f, "{op}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for WalletError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

pub trait ResultExt<T> {
    /// Annotates the error with the name of the operation that returned it.
    fn within(self, op: &'static str) -> Result<T, WalletError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<WalletError>,
{
    fn within(self, op: &'static str) -> Result<T, WalletError> {
        self.map_err(|err| err.into().within(op))
    }
}
