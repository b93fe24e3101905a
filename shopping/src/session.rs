//! Session facade over the runtime store.
//!
//! A session owns one [`Store`] running the [`ShoppingReducer`], keeps the
//! item subscription alive from [`start`](ShoppingSession::start) until
//! [`shutdown`](ShoppingSession::shutdown) or until the last clone of the
//! session is dropped, and exposes the state to the presentation.

use crate::config::ShoppingConfig;
use crate::reducer::{ShoppingEnvironment, ShoppingReducer};
use crate::repository::ItemRepository;
use crate::types::{ShoppingAction, ShoppingState};
use basket_runtime::{EffectHandle, Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Runtime store specialised for the shopping list
pub type ShoppingStore = Store<ShoppingState, ShoppingAction, ShoppingEnvironment, ShoppingReducer>;

/// One running shopping list
#[derive(Clone)]
pub struct ShoppingSession {
    store: ShoppingStore,
    shutdown_timeout: Duration,
}

impl ShoppingSession {
    /// Create the store and subscribe to the repository's items.
    ///
    /// The first snapshot arrives asynchronously; use
    /// [`subscribe`](Self::subscribe) to wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the start action cannot be dispatched.
    pub async fn start(
        repository: Arc<dyn ItemRepository>,
        config: &ShoppingConfig,
    ) -> Result<Self, StoreError> {
        let session = Self::build(repository, config);
        session.store.send(ShoppingAction::Start).await?;
        session.started();
        Ok(session)
    }

    /// Like [`start`](Self::start), but return only once the first snapshot
    /// (or load failure) has been reduced.
    ///
    /// An empty collection leaves the state unchanged, so state subscribers
    /// cannot tell it arrived; this waits on the produced actions instead.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if nothing is delivered within `timeout`
    /// - [`StoreError::ChannelClosed`] if the action broadcast closes first
    pub async fn start_and_load(
        repository: Arc<dyn ItemRepository>,
        config: &ShoppingConfig,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let session = Self::build(repository, config);
        session
            .store
            .send_and_wait_for(
                ShoppingAction::Start,
                |action| {
                    matches!(
                        action,
                        ShoppingAction::ItemsLoaded(_) | ShoppingAction::ItemsLoadFailed(_)
                    )
                },
                timeout,
            )
            .await?;
        session.started();
        Ok(session)
    }

    fn build(repository: Arc<dyn ItemRepository>, config: &ShoppingConfig) -> Self {
        let store = Store::with_config(
            ShoppingState::new(),
            ShoppingReducer::new(),
            ShoppingEnvironment::new(repository),
            config.store_config(),
        );
        Self {
            store,
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    fn started(&self) {
        tracing::info!(items = self.current_state().items.len(), "Shopping session started");
        metrics::counter!("shopping.sessions.started").increment(1);
    }

    /// Latest state snapshot
    #[must_use]
    pub fn current_state(&self) -> ShoppingState {
        self.store.snapshot()
    }

    /// Apply one action.
    ///
    /// Field updates are visible as soon as this returns. Persisted mutations
    /// continue in the background; wait on the handle to see their completion
    /// reduced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once shutdown has begun.
    pub async fn apply(&self, action: ShoppingAction) -> Result<EffectHandle, StoreError> {
        tracing::debug!(action = action.name(), "Applying action");
        self.store.send(action).await
    }

    /// Receive every published state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ShoppingState> {
        self.store.subscribe_state()
    }

    /// Receive completion events as effects produce them
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<ShoppingAction> {
        self.store.subscribe_actions()
    }

    /// Stop the item subscription and wait for in-flight mutations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if mutations are still running
    /// when the configured timeout expires.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        tracing::info!("Shopping session shutting down");
        self.store.shutdown(self.shutdown_timeout).await
    }
}
