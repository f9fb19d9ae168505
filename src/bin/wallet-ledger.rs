use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use wallet_ledger::{
    bin_utils::{OperationError, Service, csv_parser::read_wallets},
    cache::{InMemoryWalletCache, RedisWalletCache, WalletCache},
    config::Config,
    error::ErrorKind,
    repository::WalletRepository,
    service::BalanceService,
    store::{InMemoryWalletStore, PgWalletStore, WalletStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "wallet_ledger=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let filename = args
        .next()
        .context("Expected an operations file name as the first argument")?;
    let seed = match args.next() {
        Some(seed_file) => {
            let file = File::open(&seed_file)
                .with_context(|| format!("Failed to open `{seed_file}`"))?;
            read_wallets(file)?
        }
        None => Vec::new(),
    };
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let config = Config::from_env()?;

    let store: Arc<dyn WalletStore> = match &config.database_url {
        Some(url) => {
            let store = PgWalletStore::connect(url).await?;
            store.migrate().await?;
            for row in &seed {
                store.provision(row.wallet, row.balance).await?;
            }
            tracing::info!("Using PostgreSQL wallet store");
            Arc::new(store)
        }
        None => {
            let store = InMemoryWalletStore::new();
            for row in &seed {
                store.provision(row.wallet, row.balance).await;
            }
            tracing::info!("DATABASE_URL not set, using in-memory wallet store");
            Arc::new(store)
        }
    };
    let cache: Arc<dyn WalletCache> = match &config.redis_url {
        Some(url) => Arc::new(RedisWalletCache::connect(url).await?),
        None => {
            tracing::info!("REDIS_URL not set, using in-memory wallet cache");
            Arc::new(InMemoryWalletCache::new())
        }
    };

    let repository =
        Arc::new(WalletRepository::new(store, cache).with_timeout(config.operation_timeout));
    let wallets = BalanceService::builder()
        .repository(repository)
        .max_attempts(config.max_attempts)
        .build()?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        wallets: &wallets,
        error_printer: Box::new(|line, err| match &err {
            OperationError::Wallet(wallet_err)
                if matches!(
                    wallet_err.kind(),
                    ErrorKind::InsufficientFunds { .. } | ErrorKind::NotFound { .. }
                ) =>
            {
                // business outcomes, not technical failures
                tracing::debug!(line, error = %err, "operation rejected");
            }
            _ => eprintln!("Error at line {line}: {err}"),
        }),
    };
    service.run().await
}
