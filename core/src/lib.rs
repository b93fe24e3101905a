//! # Basket Core
//!
//! Core traits and types for the Basket grocery-list architecture.
//!
//! This crate provides the fundamental abstractions the list reducer is built on:
//!
//! - **State**: The in-memory snapshot driving the presentation
//! - **Action**: All possible inputs to a reducer (user intents and completions)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (item store, secret storage)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use basket_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Domain primitives: items, identifiers and categories
pub mod item;

/// Item store trait and storage errors
pub mod item_store;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime. Most actions produce at
        /// most one, so the inline capacity avoids heap allocation.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) returned from reducers.
pub mod effect {
    use futures::Stream;
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future producing an optional feedback action
    pub type ActionFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Boxed stream of feedback actions
    pub type ActionStream<Action> = Pin<Box<dyn Stream<Item = Action> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(ActionFuture<Action>),

        /// Long-lived subscription
        ///
        /// Every item the stream yields is fed back into the reducer. The runtime
        /// keeps the stream alive until it ends or the store shuts down.
        Stream(ActionStream<Action>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Stream(_) => write!(f, "Effect::Stream(<stream>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Wrap a future as an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Wrap a stream as an effect
        #[must_use]
        pub fn stream<S>(stream: S) -> Effect<Action>
        where
            S: Stream<Item = Action> + Send + 'static,
        {
            Effect::Stream(Box::pin(stream))
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter. The item store lives in [`crate::item_store`].
pub mod environment {
    use thiserror::Error;

    /// Errors raised while loading or creating the storage secret.
    #[derive(Error, Debug)]
    pub enum SecretError {
        /// The backing secret file could not be read or written.
        #[error("Secret I/O error: {0}")]
        Io(#[from] std::io::Error),

        /// A stored secret exists but is unusable (empty or malformed).
        #[error("Invalid secret: {0}")]
        Invalid(String),
    }

    /// Secret storage capability - provides the passphrase protecting the item database.
    ///
    /// The first call creates and persists a secret; every later call returns the
    /// same bytes. Platforms swap the implementation (file, OS keychain, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use basket_core::environment::{SecretError, SecretStore};
    ///
    /// struct Constant;
    ///
    /// impl SecretStore for Constant {
    ///     fn get_or_create_secret(&self) -> Result<Vec<u8>, SecretError> {
    ///         Ok(b"correct horse battery staple".to_vec())
    ///     }
    /// }
    ///
    /// assert!(!Constant.get_or_create_secret().unwrap().is_empty());
    /// ```
    pub trait SecretStore: Send + Sync {
        /// Return the existing secret, creating and persisting one if absent.
        ///
        /// # Errors
        ///
        /// Returns [`SecretError`] if the backing storage cannot be read or written.
        fn get_or_create_secret(&self) -> Result<Vec<u8>, SecretError>;
    }
}
