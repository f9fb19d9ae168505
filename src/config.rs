use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} has not been configured")]
    MissingDependency(&'static str),
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL connection string. Unset selects the in-memory store.
    pub database_url: Option<String>,
    /// Redis connection string. Unset selects the in-memory cache.
    pub redis_url: Option<String>,
    pub max_attempts: u32,
    pub operation_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            operation_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_attempts = match non_empty("WALLET_MAX_ATTEMPTS") {
            Some(raw) => parse_positive("WALLET_MAX_ATTEMPTS", &raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let operation_timeout = non_empty("WALLET_OPERATION_TIMEOUT_MS")
            .map(|raw| parse_positive::<u64>("WALLET_OPERATION_TIMEOUT_MS", &raw))
            .transpose()?
            .map(Duration::from_millis);

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            redis_url: non_empty("REDIS_URL"),
            max_attempts,
            operation_timeout,
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let invalid = |reason| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
        reason,
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| invalid("not a non-negative integer"))?;
    if value == T::default() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(value)
}
