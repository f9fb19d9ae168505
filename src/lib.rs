/// Wallet record and the credit/debit arithmetic that guards its balance.
pub mod wallet;

/// Error taxonomy shared by every layer, annotated with operation names.
pub mod error;

/// Environment configuration and construction errors.
pub mod config;

/// Cache Accessor contract plus Redis and in-memory backends.
pub mod cache;

/// Durable Store Accessor contract plus PostgreSQL and in-memory backends.
pub mod store;

/// Composes store and cache behind the get/update capabilities.
pub mod repository;

/// Balance business logic. Depends only on the repository capabilities,
/// so any backend (or a fake) can sit behind it.
pub mod service;

/// Validated caller input, executed against [`service::WalletOperations`].
pub mod command;

/// Ideally, this module should exist in its own crate, as a way to
/// drive the core from the command line. It lives here so integration
/// tests can use it.
pub mod bin_utils;

#[cfg(test)]
mod testing;
