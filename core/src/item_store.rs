//! Item store trait and related types.
//!
//! An item store is the durable, identity-assigning collection behind the
//! shopping list. It offers exactly what the list needs:
//!
//! - Observe the whole collection as a stream of snapshots
//! - Add an item, receiving its assigned identity
//! - Update or delete an item by identity
//!
//! # Implementations
//!
//! - `SqliteItemStore` (in `basket-sqlite`): Passphrase-keyed on-device database
//! - `InMemoryItemStore` (in `basket-testing`): Fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures and streams instead of using `async fn` so
//! the store can be shared as `Arc<dyn ItemStore>` and captured by effects.

use crate::item::{Item, ItemId, NewItem};
use futures::stream::BoxStream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by item store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Stream of collection snapshots returned by [`ItemStore::observe_all`]
pub type ItemsStream = BoxStream<'static, Result<Vec<Item>, StorageError>>;

/// Errors that can occur during item store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No item with this identity exists.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// The underlying database rejected or failed the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored data could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Durable keyed collection of shopping items.
///
/// Implementations serialize conflicting writes themselves; callers may issue
/// operations concurrently.
pub trait ItemStore: Send + Sync {
    /// Observe the whole collection.
    ///
    /// The stream yields the current items immediately (even when there are
    /// none) and a fresh snapshot after every committed write. Snapshots are in
    /// the store's natural order (ascending id). Fast writers may be coalesced
    /// into one snapshot, but the latest committed state is always delivered.
    fn observe_all(&self) -> ItemsStream;

    /// Insert a new item and return it with its assigned identity.
    ///
    /// # Errors
    ///
    /// - `Database`: the write failed
    fn add(&self, item: NewItem) -> StoreFuture<'_, Item>;

    /// Replace the stored item that has the same identity.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no item has this id
    /// - `Database`: the write failed
    fn update(&self, item: Item) -> StoreFuture<'_, ()>;

    /// Remove the stored item that has the same identity.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no item has this id
    /// - `Database`: the write failed
    fn delete(&self, item: Item) -> StoreFuture<'_, ()>;
}
