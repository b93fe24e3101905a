//! SQLite item store for Basket.
//!
//! This crate provides the durable backing for the shopping list. It
//! implements the `ItemStore` trait from `basket-core` on top of sqlx and
//! supports:
//!
//! - Identity assignment via `AUTOINCREMENT` (ids are never reused)
//! - Snapshot observation that re-queries after every committed write
//! - Passphrase keying through `PRAGMA key` (encrypts when built with the
//!   `sqlcipher` feature)
//! - A file-backed passphrase source, [`FileSecretStore`]
//!
//! # Example
//!
//! ```ignore
//! use basket_sqlite::{FileSecretStore, SqliteItemStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let secrets = FileSecretStore::new("basket.secret");
//!     let store = SqliteItemStore::open("basket.db", &secrets).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod secret;
pub mod store;

pub use secret::FileSecretStore;
pub use store::{OpenError, SqliteItemStore};
