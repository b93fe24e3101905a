//! sqlx-backed implementation of [`ItemStore`].

use basket_core::environment::{SecretError, SecretStore};
use basket_core::item::{Category, Item, ItemId, NewItem};
use basket_core::item_store::{ItemStore, ItemsStream, StorageError, StoreFuture};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::borrow::Cow;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Connections kept for a file-backed database
const FILE_POOL_SIZE: u32 = 4;

/// Errors that can occur while opening a [`SqliteItemStore`].
#[derive(Error, Debug)]
pub enum OpenError {
    /// The passphrase could not be obtained.
    #[error("Passphrase unavailable: {0}")]
    Secret(#[from] SecretError),

    /// The database could not be opened or migrated.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Built for SQLCipher, but the linked SQLite does not encrypt.
    #[error("Linked SQLite library does not support encryption")]
    EncryptionUnavailable,
}

/// SQLite-backed item store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE shopping_items (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name TEXT NOT NULL,
///     category TEXT NOT NULL,
///     is_purchased INTEGER NOT NULL DEFAULT 0
/// );
/// ```
///
/// Categories are stored by enumeration name and decoded leniently, so an
/// unknown value reads back as the default category.
///
/// # Observation
///
/// Each committed write bumps a revision on a `watch` channel. Observers
/// re-query the table whenever the revision moves, which means bursts of
/// writes can be coalesced into one snapshot but the last one is never missed.
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: SqlitePool,
    revision: Arc<watch::Sender<u64>>,
}

impl SqliteItemStore {
    /// Open (creating if missing) the database at `path`, keyed with the
    /// passphrase from `secrets`, and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// - [`OpenError::Secret`] if the passphrase cannot be read or created
    /// - [`OpenError::Storage`] if connecting or migrating fails, including a
    ///   wrong passphrase on an encrypted database
    /// - [`OpenError::EncryptionUnavailable`] if built with the `sqlcipher`
    ///   feature but the linked library ignores the key
    ///
    /// Without the `sqlcipher` feature the file is opened unencrypted and a
    /// warning is logged.
    pub async fn open(path: impl AsRef<Path>, secrets: &dyn SecretStore) -> Result<Self, OpenError> {
        let secret = secrets.get_or_create_secret()?;
        let passphrase = String::from_utf8(secret)
            .map_err(|_| SecretError::Invalid("passphrase is not valid UTF-8".to_string()))?;

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .pragma("key", Cow::<'static, str>::Owned(quote_literal(&passphrase)));

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_POOL_SIZE)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to open database: {e}")))?;

        let store = Self::with_pool(pool).await?;
        match store.cipher_version().await? {
            Some(version) => {
                tracing::info!(path = %path.as_ref().display(), cipher = %version, "Opened encrypted item database");
            },
            None if cfg!(feature = "sqlcipher") => {
                store.pool.close().await;
                return Err(OpenError::EncryptionUnavailable);
            },
            None => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    "Opened item database WITHOUT encryption; build with the `sqlcipher` feature"
                );
            },
        }
        Ok(store)
    }

    /// SQLCipher version of the linked library, or `None` for stock SQLite
    /// (which silently ignores `PRAGMA key`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the query fails.
    pub async fn cipher_version(&self) -> Result<Option<String>, StorageError> {
        let version: Option<String> = sqlx::query_scalar("PRAGMA cipher_version")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(version.filter(|v| !v.is_empty()))
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection that never expires, since closing it
    /// would discard the data.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the database cannot be created.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Database(format!("Invalid database options: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to open database: {e}")))?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and run migrations on it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if migration fails.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Database(format!("Migration failed: {e}")))?;

        let (revision, _) = watch::channel(0);
        Ok(Self {
            pool,
            revision: Arc::new(revision),
        })
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read every item in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query or row decoding fails.
    pub async fn fetch_all(&self) -> Result<Vec<Item>, StorageError> {
        fetch_all(&self.pool).await
    }

    fn committed(&self, op: &'static str) {
        self.revision.send_modify(|revision| *revision += 1);
        metrics::counter!("item_store.writes", "op" => op).increment(1);
    }
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Item>, StorageError> {
    let rows: Vec<(i64, String, String, bool)> = sqlx::query_as(
        "SELECT id, name, category, is_purchased FROM shopping_items ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .map_err(storage_error)?;

    Ok(rows
        .into_iter()
        .map(|(id, name, category, purchased)| {
            Item::new(ItemId::new(id), name, Category::from_name(&category), purchased)
        })
        .collect())
}

impl ItemStore for SqliteItemStore {
    fn observe_all(&self) -> ItemsStream {
        let pool = self.pool.clone();
        let mut revisions = self.revision.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                // Mark seen before querying so a write racing the query
                // triggers another pass
                drop(revisions.borrow_and_update());
                yield fetch_all(&pool).await;
                if revisions.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn add(&self, item: NewItem) -> StoreFuture<'_, Item> {
        Box::pin(async move {
            let result = sqlx::query(
                "INSERT INTO shopping_items (name, category, is_purchased) VALUES (?, ?, 0)",
            )
            .bind(&item.name)
            .bind(item.category.name())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

            let id = ItemId::new(result.last_insert_rowid());
            tracing::debug!(item_id = %id, name = %item.name, "Item inserted");
            self.committed("add");

            Ok(Item::new(id, item.name, item.category, false))
        })
    }

    fn update(&self, item: Item) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE shopping_items SET name = ?, category = ?, is_purchased = ? WHERE id = ?",
            )
            .bind(&item.name)
            .bind(item.category.name())
            .bind(item.purchased)
            .bind(item.id.get())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound(item.id));
            }

            tracing::debug!(item_id = %item.id, "Item updated");
            self.committed("update");
            Ok(())
        })
    }

    fn delete(&self, item: Item) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM shopping_items WHERE id = ?")
                .bind(item.id.get())
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound(item.id));
            }

            tracing::debug!(item_id = %item.id, "Item deleted");
            self.committed("delete");
            Ok(())
        })
    }
}

fn storage_error(error: sqlx::Error) -> StorageError {
    match error {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::Corrupt(error.to_string())
        },
        other => StorageError::Database(other.to_string()),
    }
}

/// Quote a value as an SQL string literal
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_escapes_quotes() {
        assert_eq!(quote_literal("abc"), "'abc'");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_decode_errors_are_corrupt() {
        let error = sqlx::Error::Decode("bad".into());
        assert!(matches!(storage_error(error), StorageError::Corrupt(_)));
        assert!(matches!(
            storage_error(sqlx::Error::PoolClosed),
            StorageError::Database(_)
        ));
    }
}
