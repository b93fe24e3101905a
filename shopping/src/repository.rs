//! Repository seam between the reducer and the item store.
//!
//! The reducer only ever talks to an [`ItemRepository`]. In production that is
//! a [`StoreRepository`] over the SQLite store; tests swap in anything that
//! implements the trait.

use basket_core::item::{Item, NewItem};
use basket_core::item_store::{ItemStore, ItemsStream, StoreFuture};
use std::sync::Arc;
use tracing::Instrument;

/// Item operations available to the shopping list
///
/// # Errors
///
/// Every mutation surfaces the store's `StorageError` unchanged.
pub trait ItemRepository: Send + Sync {
    /// Observe the whole collection as a stream of snapshots
    fn observe_items(&self) -> ItemsStream;

    /// Add an item, returning it with its assigned identity
    fn add_item(&self, item: NewItem) -> StoreFuture<'_, Item>;

    /// Replace the stored item with the same identity
    fn update_item(&self, item: Item) -> StoreFuture<'_, ()>;

    /// Remove the stored item with the same identity
    fn delete_item(&self, item: Item) -> StoreFuture<'_, ()>;
}

/// Pass-through repository over any [`ItemStore`]
#[derive(Clone)]
pub struct StoreRepository {
    store: Arc<dyn ItemStore>,
}

impl StoreRepository {
    /// Wrap an item store
    #[must_use]
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }
}

impl ItemRepository for StoreRepository {
    fn observe_items(&self) -> ItemsStream {
        tracing::debug!("Observing items");
        self.store.observe_all()
    }

    fn add_item(&self, item: NewItem) -> StoreFuture<'_, Item> {
        let span = tracing::debug_span!("add_item", name = %item.name, category = %item.category.name());
        Box::pin(self.store.add(item).instrument(span))
    }

    fn update_item(&self, item: Item) -> StoreFuture<'_, ()> {
        let span = tracing::debug_span!("update_item", item_id = %item.id);
        Box::pin(self.store.update(item).instrument(span))
    }

    fn delete_item(&self, item: Item) -> StoreFuture<'_, ()> {
        let span = tracing::debug_span!("delete_item", item_id = %item.id);
        Box::pin(self.store.delete(item).instrument(span))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use basket_core::item::Category;
    use basket_testing::mocks::{InMemoryItemStore, Write};
    use futures::StreamExt;

    #[tokio::test]
    async fn passes_operations_through() {
        let store = InMemoryItemStore::new();
        let repository = StoreRepository::new(Arc::new(store.clone()));

        let added = repository
            .add_item(NewItem::new("Bananas", Category::Fruits))
            .await
            .unwrap();
        repository.update_item(added.toggled()).await.unwrap();
        repository.delete_item(added.toggled()).await.unwrap();

        assert_eq!(
            store.writes(),
            vec![
                Write::Add(NewItem::new("Bananas", Category::Fruits)),
                Write::Update(added.toggled()),
                Write::Delete(added.toggled()),
            ]
        );
        let snapshot = repository.observe_items().next().await.unwrap().unwrap();
        assert!(snapshot.is_empty());
    }
}
