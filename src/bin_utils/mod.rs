//! Batch driver: feeds CSV wallet operations through [`WalletOperations`]
//! and prints the resulting balances. A thin caller of the core, nothing more.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use crate::{
    command::{WalletCommand, WalletCommandError},
    error::WalletError,
    service::WalletOperations,
    wallet::WalletId,
};
use anyhow::{Context, Result};
use csv_parser::CsvOperationParser;
use csv_printer::{WalletBalance, print_wallets};
use thiserror::Error;

pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Command(#[from] WalletCommandError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

pub struct Service<'w, R, W: 'w, P: ?Sized> {
    pub input: R,
    pub output: &'w mut W,
    pub wallets: &'w P,
    pub error_printer: Box<dyn FnMut(u64, OperationError) + 'w>,
}

impl<'w, R, W, P> Service<'w, R, W, P>
where
    R: Read,
    W: Write + 'w,
    P: WalletOperations + ?Sized,
{
    pub async fn run(mut self) -> Result<()> {
        let parser = CsvOperationParser::new(self.input);
        let mut touched = BTreeSet::<WalletId>::new();

        for (line, row) in parser {
            let row = row?;
            let result = match WalletCommand::parse(row.kind, row.wallet, row.amount) {
                Ok(command) => command
                    .execute(self.wallets)
                    .await
                    .map_err(OperationError::from),
                Err(err) => Err(err.into()),
            };
            match result {
                Ok(wallet) => {
                    touched.insert(wallet.id);
                }
                Err(err) => (self.error_printer)(line, err),
            }
        }

        let mut balances = Vec::with_capacity(touched.len());
        for wallet_id in touched {
            let wallet = self
                .wallets
                .wallet_balance(wallet_id)
                .await
                .with_context(|| format!("Failed to read final balance of wallet {wallet_id}"))?;
            balances.push(WalletBalance::from(wallet));
        }
        print_wallets(self.output, balances.into_iter())
    }
}
