use std::io::Write;

use crate::wallet::{Wallet, WalletId};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WalletBalance {
    pub wallet: WalletId,
    pub balance: Decimal,
}

impl From<Wallet> for WalletBalance {
    fn from(wallet: Wallet) -> Self {
        Self {
            wallet: wallet.id,
            balance: wallet.balance,
        }
    }
}

pub fn print_wallets<W>(
    output: &mut W,
    wallets: impl Iterator<Item = WalletBalance>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for wallet in wallets {
        if let Err(err) = writer.serialize(wallet) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
