use std::io::Read;

use crate::{command::OperationKind, wallet::WalletId};
use anyhow::Context;
use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub wallet: WalletId,
    pub amount: Option<Decimal>,
}

/// Row of a provisioning file (`wallet,balance`) used to seed wallets.
#[derive(Debug, Deserialize)]
pub struct WalletRow {
    pub wallet: WalletId,
    pub balance: Decimal,
}

/// Parses wallet operations in CSV format, yielding each with its line number
pub struct CsvOperationParser<R> {
    iter: DeserializeRecordsIntoIter<R, Operation>,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = (u64, anyhow::Result<Operation>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| {
            (
                curr_line,
                row.with_context(|| format!("Malformed operation at line {curr_line}")),
            )
        })
    }
}

pub fn read_wallets<R>(source: R) -> anyhow::Result<Vec<WalletRow>>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(source)
        .into_deserialize::<WalletRow>()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to parse wallets CSV")
}
