//! # Basket Testing
//!
//! Testing utilities and helpers for the Basket reducer architecture.
//!
//! This crate provides:
//! - Mock implementations of the item store and secret store
//! - Test helpers for waiting on published state
//! - Property-based testing strategies for domain types
//! - Assertion helpers for reducers and stores
//!
//! ## Example
//!
//! ```ignore
//! use basket_testing::mocks::InMemoryItemStore;
//! use basket_core::item::{Category, NewItem};
//!
//! #[tokio::test]
//! async fn test_add_round_trip() {
//!     let store = InMemoryItemStore::new();
//!     let item = store.add(NewItem::new("Bananas", Category::Fruits)).await.unwrap();
//!
//!     assert_eq!(store.items(), vec![item]);
//!     assert_eq!(store.writes().len(), 1);
//! }
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use basket_core::environment::{SecretError, SecretStore};
    use basket_core::item::{Item, ItemId, NewItem};
    use basket_core::item_store::{ItemStore, ItemsStream, StorageError, StoreFuture};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard};
    use tokio::sync::watch;

    /// Latest published view of the collection
    type Snapshot = Result<Vec<Item>, StorageError>;

    /// A write attempted against an [`InMemoryItemStore`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Write {
        /// `add` was called
        Add(NewItem),
        /// `update` was called
        Update(Item),
        /// `delete` was called
        Delete(Item),
    }

    #[derive(Debug)]
    struct Inner {
        items: Mutex<BTreeMap<ItemId, Item>>,
        next_id: Mutex<i64>,
        writes: Mutex<Vec<Write>>,
        fail_writes: AtomicBool,
        snapshots: watch::Sender<Snapshot>,
    }

    /// In-memory item store for fast, deterministic tests
    ///
    /// Behaves like the durable store: identities are assigned from 1 upward
    /// and never reused, and every committed write publishes a fresh snapshot
    /// to all observers. On top of that it records every attempted write and
    /// can be told to fail writes or loads.
    ///
    /// Clones share the same collection.
    #[derive(Debug, Clone)]
    pub struct InMemoryItemStore {
        inner: Arc<Inner>,
    }

    impl InMemoryItemStore {
        /// Create an empty store
        #[must_use]
        pub fn new() -> Self {
            let (snapshots, _) = watch::channel(Ok(Vec::new()));
            Self {
                inner: Arc::new(Inner {
                    items: Mutex::new(BTreeMap::new()),
                    next_id: Mutex::new(1),
                    writes: Mutex::new(Vec::new()),
                    fail_writes: AtomicBool::new(false),
                    snapshots,
                }),
            }
        }

        /// Create a store already holding `items`
        ///
        /// Seeding does not show up in [`writes`](Self::writes). Identities are
        /// assigned in the given order.
        #[must_use]
        pub fn with_items(items: impl IntoIterator<Item = NewItem>) -> Self {
            let store = Self::new();
            if let (Ok(mut map), Ok(mut next_id)) =
                (store.inner.items.lock(), store.inner.next_id.lock())
            {
                for new_item in items {
                    let id = ItemId::new(*next_id);
                    *next_id += 1;
                    map.insert(id, Item::new(id, new_item.name, new_item.category, false));
                }
                store.publish(&map);
            }
            store
        }

        /// Current contents in natural (ascending id) order
        #[must_use]
        pub fn items(&self) -> Vec<Item> {
            self.inner
                .items
                .lock()
                .map(|map| map.values().cloned().collect())
                .unwrap_or_default()
        }

        /// Every write attempted so far, including failed ones
        #[must_use]
        pub fn writes(&self) -> Vec<Write> {
            self.inner
                .writes
                .lock()
                .map(|writes| writes.clone())
                .unwrap_or_default()
        }

        /// Make subsequent writes fail with a database error
        pub fn fail_writes(&self, fail: bool) {
            self.inner.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Deliver a load failure to every observer
        ///
        /// The failure replaces the latest snapshot; the next committed write
        /// publishes the collection again.
        pub fn fail_load(&self, message: impl Into<String>) {
            self.inner
                .snapshots
                .send_replace(Err(StorageError::Database(message.into())));
        }

        /// Number of live `observe_all` streams
        #[must_use]
        pub fn observer_count(&self) -> usize {
            self.inner.snapshots.receiver_count()
        }

        fn lock_items(&self) -> Result<MutexGuard<'_, BTreeMap<ItemId, Item>>, StorageError> {
            self.inner
                .items
                .lock()
                .map_err(|_| StorageError::Database("item lock poisoned".to_string()))
        }

        fn record(&self, write: Write) -> Result<(), StorageError> {
            if let Ok(mut writes) = self.inner.writes.lock() {
                writes.push(write);
            }
            if self.inner.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Database("injected write failure".to_string()));
            }
            Ok(())
        }

        fn publish(&self, map: &BTreeMap<ItemId, Item>) {
            self.inner
                .snapshots
                .send_replace(Ok(map.values().cloned().collect()));
        }
    }

    impl Default for InMemoryItemStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ItemStore for InMemoryItemStore {
        fn observe_all(&self) -> ItemsStream {
            let mut rx = self.inner.snapshots.subscribe();
            Box::pin(async_stream::stream! {
                loop {
                    let snapshot = rx.borrow_and_update().clone();
                    yield snapshot;
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            })
        }

        fn add(&self, item: NewItem) -> StoreFuture<'_, Item> {
            Box::pin(async move {
                self.record(Write::Add(item.clone()))?;
                let mut map = self.lock_items()?;
                let id = {
                    let mut next_id = self
                        .inner
                        .next_id
                        .lock()
                        .map_err(|_| StorageError::Database("id lock poisoned".to_string()))?;
                    let id = ItemId::new(*next_id);
                    *next_id += 1;
                    id
                };
                let stored = Item::new(id, item.name, item.category, false);
                map.insert(id, stored.clone());
                self.publish(&map);
                Ok(stored)
            })
        }

        fn update(&self, item: Item) -> StoreFuture<'_, ()> {
            Box::pin(async move {
                self.record(Write::Update(item.clone()))?;
                let mut map = self.lock_items()?;
                let Some(slot) = map.get_mut(&item.id) else {
                    return Err(StorageError::NotFound(item.id));
                };
                *slot = item;
                self.publish(&map);
                Ok(())
            })
        }

        fn delete(&self, item: Item) -> StoreFuture<'_, ()> {
            Box::pin(async move {
                self.record(Write::Delete(item.clone()))?;
                let mut map = self.lock_items()?;
                if map.remove(&item.id).is_none() {
                    return Err(StorageError::NotFound(item.id));
                }
                self.publish(&map);
                Ok(())
            })
        }
    }

    /// Secret store that always returns the same bytes
    #[derive(Debug, Clone)]
    pub struct FixedSecretStore {
        secret: Vec<u8>,
    }

    impl FixedSecretStore {
        /// Create a store returning `secret`
        #[must_use]
        pub fn new(secret: impl Into<Vec<u8>>) -> Self {
            Self {
                secret: secret.into(),
            }
        }
    }

    impl SecretStore for FixedSecretStore {
        fn get_or_create_secret(&self) -> Result<Vec<u8>, SecretError> {
            if self.secret.is_empty() {
                return Err(SecretError::Invalid("secret is empty".to_string()));
            }
            Ok(self.secret.clone())
        }
    }

    /// Create a fixed secret store with a deterministic passphrase
    #[must_use]
    pub fn test_secret() -> FixedSecretStore {
        FixedSecretStore::new("basket-test-passphrase-000000000")
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use basket_runtime::StoreError;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Wait until a published state satisfies `predicate`
    ///
    /// Checks the current value first, then every later snapshot.
    ///
    /// # Errors
    ///
    /// - `Timeout`: no matching snapshot within `timeout`
    /// - `ChannelClosed`: the publisher went away first
    pub async fn wait_for_state<S, F>(
        rx: &mut watch::Receiver<S>,
        predicate: F,
        timeout: Duration,
    ) -> Result<S, StoreError>
    where
        S: Clone,
        F: Fn(&S) -> bool,
    {
        let waiting = async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if predicate(&*current) {
                        return Ok(current.clone());
                    }
                }
                rx.changed().await.map_err(|_| StoreError::ChannelClosed)?;
            }
        };

        tokio::time::timeout(timeout, waiting)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

/// Property-based testing strategies using proptest.
pub mod properties {
    use basket_core::item::{Category, Item, ItemId};
    use proptest::prelude::*;

    /// Any category
    pub fn category() -> impl Strategy<Value = Category> {
        prop::sample::select(Category::ALL.to_vec())
    }

    /// Short item names, mixed case, sometimes padded with spaces
    pub fn item_name() -> impl Strategy<Value = String> {
        "[ ]{0,2}[A-Za-z][A-Za-z ]{0,11}"
    }

    /// Names that are empty or whitespace only
    pub fn blank_name() -> impl Strategy<Value = String> {
        "[ \t]{0,4}"
    }

    /// Collections of up to `max` items with unique identities, in arbitrary order
    pub fn items(max: usize) -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((item_name(), category(), any::<bool>()), 0..=max)
            .prop_map(|rows| {
                rows.into_iter()
                    .zip(1_i64..)
                    .map(|((name, category, purchased), id)| {
                        Item::new(ItemId::new(id), name, category, purchased)
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    }
}
