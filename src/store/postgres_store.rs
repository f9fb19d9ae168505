use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    error::{ErrorKind, ResultExt, WalletError},
    wallet::{Version, Wallet, WalletId},
};

use super::WalletStore;

/// PostgreSQL-backed store over a single `wallets` table.
#[derive(Clone)]
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, WalletError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(ErrorKind::storage)
            .within("connect_store")?;

        if database_url.contains("sslmode=require") || database_url.contains("sslmode=prefer") {
            tracing::info!("Database connection configured to use TLS");
        } else if !database_url.contains("localhost") && !database_url.contains("127.0.0.1") {
            tracing::warn!(
                "Connecting to remote database without explicit sslmode. Consider adding sslmode=require"
            );
        }

        Ok(Self::new(pool))
    }

    /// Creates the `wallets` table if it is missing.
    pub async fn migrate(&self) -> Result<(), WalletError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(ErrorKind::storage)
            .within("migrate")
    }

    /// Inserts a wallet unless one with the same id already exists.
    /// Returns whether a row was created.
    pub async fn provision(&self, wallet_id: WalletId, balance: Decimal) -> Result<bool, WalletError> {
        let result = sqlx::query(
            "INSERT INTO wallets (id, balance, version) VALUES ($1, $2, 0) ON CONFLICT (id) DO NOTHING",
        )
        .bind(wallet_id)
        .bind(balance)
        .execute(&self.pool)
        .await
        .map_err(ErrorKind::storage)
        .within("provision")?;
        Ok(result.rows_affected() == 1)
    }

    async fn exists(&self, wallet_id: WalletId) -> Result<bool, ErrorKind> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM wallets WHERE id = $1)")
            .bind(wallet_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ErrorKind::storage)
    }
}

fn wallet_from_row(row: &PgRow) -> Result<Wallet, sqlx::Error> {
    Ok(Wallet {
        id: row.try_get("id")?,
        balance: row.try_get("balance")?,
        version: row.try_get("version")?,
    })
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn fetch(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        let row = sqlx::query("SELECT id, balance, version FROM wallets WHERE id = $1")
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ErrorKind::storage)
            .within("fetch")?;
        match row {
            Some(row) => wallet_from_row(&row)
                .map_err(ErrorKind::storage)
                .within("fetch"),
            None => Err(ErrorKind::NotFound { wallet_id }).within("fetch"),
        }
    }

    async fn persist(
        &self,
        wallet_id: WalletId,
        new_balance: Decimal,
        expected_version: Version,
    ) -> Result<Wallet, WalletError> {
        let row = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING id, balance, version
            "#,
        )
        .bind(new_balance)
        .bind(wallet_id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(ErrorKind::storage)
        .within("persist")?;

        if let Some(row) = row {
            return wallet_from_row(&row)
                .map_err(ErrorKind::storage)
                .within("persist");
        }
        // Nothing matched: either the row is gone or its version moved on.
        if self.exists(wallet_id).await.within("persist")? {
            Err(ErrorKind::Conflict { wallet_id }).within("persist")
        } else {
            Err(ErrorKind::NotFound { wallet_id }).within("persist")
        }
    }
}
