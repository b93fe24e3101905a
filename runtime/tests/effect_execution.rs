//! Integration tests for effect execution in the Store runtime
//!
//! Covers stream subscriptions, completion ordering and graceful shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use basket_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use basket_runtime::{Store, StoreConfig, StoreError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, Clone, PartialEq)]
enum FeedAction {
    Subscribe,
    Received(String),
    Slow { label: String, delay_ms: u64 },
    Finished(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct FeedState {
    received: Vec<String>,
    finished: Vec<String>,
}

#[derive(Clone)]
struct FeedEnvironment {
    items: std::sync::Arc<std::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>>,
}

#[derive(Clone)]
struct FeedReducer;

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::Subscribe => {
                let Some(rx) = env.items.lock().unwrap().take() else {
                    return smallvec![Effect::None];
                };
                let stream = futures::StreamExt::map(UnboundedReceiverStream::new(rx), FeedAction::Received);
                smallvec![Effect::stream(stream)]
            },
            FeedAction::Received(item) => {
                state.received.push(item);
                smallvec![Effect::None]
            },
            FeedAction::Slow { label, delay_ms } => {
                smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Some(FeedAction::Finished(label))
                })]
            },
            FeedAction::Finished(label) => {
                state.finished.push(label);
                smallvec![Effect::None]
            },
        }
    }
}

fn feed() -> (FeedEnvironment, mpsc::UnboundedSender<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let env = FeedEnvironment {
        items: std::sync::Arc::new(std::sync::Mutex::new(Some(rx))),
    };
    (env, tx)
}

async fn wait_until<F>(store: &Store<FeedState, FeedAction, FeedEnvironment, FeedReducer>, predicate: F)
where
    F: Fn(&FeedState) -> bool,
{
    let mut rx = store.subscribe_state();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if predicate(&*rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("state condition not reached in time");
}

#[tokio::test]
async fn test_stream_items_are_reduced_in_order() {
    let (env, tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store.send(FeedAction::Subscribe).await.unwrap();
    for item in ["milk", "bread", "eggs"] {
        tx.send(item.to_string()).unwrap();
    }

    wait_until(&store, |s| s.received.len() == 3).await;
    let received = store.state(|s| s.received.clone()).await;
    assert_eq!(received, vec!["milk", "bread", "eggs"]);
}

#[tokio::test]
async fn test_stream_is_not_tracked_by_handle() {
    let (env, _tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    let mut handle = store.send(FeedAction::Subscribe).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_millis(50))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_completions_apply_in_finish_order() {
    let (env, _tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store
        .send(FeedAction::Slow {
            label: "slow".into(),
            delay_ms: 60,
        })
        .await
        .unwrap();
    store
        .send(FeedAction::Slow {
            label: "fast".into(),
            delay_ms: 5,
        })
        .await
        .unwrap();

    wait_until(&store, |s| s.finished.len() == 2).await;
    let finished = store.state(|s| s.finished.clone()).await;
    assert_eq!(finished, vec!["fast", "slow"]);
}

#[tokio::test]
async fn test_shutdown_rejects_new_actions() {
    let (env, _tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store.shutdown(Duration::from_millis(100)).await.unwrap();

    let result = store.send(FeedAction::Subscribe).await;
    assert_eq!(result.err(), Some(StoreError::ShutdownInProgress));
}

#[tokio::test]
async fn test_shutdown_aborts_subscriptions() {
    let (env, tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store.send(FeedAction::Subscribe).await.unwrap();
    tx.send("before".into()).unwrap();
    wait_until(&store, |s| s.received.len() == 1).await;

    store.shutdown(Duration::from_millis(100)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Receiver is gone with the aborted task
    assert!(tx.send("after".into()).is_err());
    let received = store.state(|s| s.received.clone()).await;
    assert_eq!(received, vec!["before"]);
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_futures_report_back() {
    let (env, _tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store
        .send(FeedAction::Slow {
            label: "in-flight".into(),
            delay_ms: 20,
        })
        .await
        .unwrap();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.pending_effects(), 0);
    let finished = store.state(|s| s.finished.clone()).await;
    assert_eq!(finished, vec!["in-flight"]);
}

#[tokio::test]
async fn test_shutdown_times_out_on_slow_effects() {
    let (env, _tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);

    store
        .send(FeedAction::Slow {
            label: "very slow".into(),
            delay_ms: 500,
        })
        .await
        .unwrap();

    let result = store.shutdown(Duration::from_millis(20)).await;
    assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
}

#[tokio::test]
async fn test_dropping_last_store_handle_aborts_subscriptions() {
    let (env, tx) = feed();
    let store = Store::new(FeedState::default(), FeedReducer, env);
    let observer = store.clone();

    store.send(FeedAction::Subscribe).await.unwrap();
    tx.send("before".into()).unwrap();
    wait_until(&store, |s| s.received.len() == 1).await;

    // Another handle still owns the store
    drop(store);
    tokio::time::sleep(Duration::from_millis(10)).await;
    tx.send("still open".into()).unwrap();
    wait_until(&observer, |s| s.received.len() == 2).await;

    drop(observer);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(tx.send("after".into()).is_err());
}

#[tokio::test]
async fn test_store_keeps_its_config() {
    let (env, _tx) = feed();
    let config = StoreConfig::default()
        .with_broadcast_capacity(3)
        .with_shutdown_timeout(Duration::from_millis(40));
    let store = Store::with_config(FeedState::default(), FeedReducer, env, config);

    assert_eq!(store.config().broadcast_capacity, 3);
    assert_eq!(store.config().shutdown_timeout, Duration::from_millis(40));
    assert_eq!(store.pending_effects(), 0);
}
