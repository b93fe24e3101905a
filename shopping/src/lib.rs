//! Grocery list state core built on the Basket reducer architecture.
//!
//! A single shopping list: users add, edit, categorize, mark purchased,
//! filter, and sort items that live in an on-device database. This crate
//! holds the part with real logic in it:
//!
//! - [`ShoppingState`]: the authoritative items plus input fields, with the
//!   filtered and sorted view derived on read
//! - [`ShoppingAction`]: user intents (`#[command]`) and store completions
//!   (`#[event]`)
//! - [`ShoppingReducer`]: validation, field updates, and persistence effects
//! - [`ShoppingSession`]: the facade a presentation layer drives
//!
//! # Quick Start
//!
//! ```no_run
//! use basket_sqlite::{FileSecretStore, SqliteItemStore};
//! use shopping::{ShoppingAction, ShoppingConfig, ShoppingSession, StoreRepository};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ShoppingConfig::from_env()?;
//! let secrets = FileSecretStore::new(&config.secret_path);
//! let store = SqliteItemStore::open(&config.database_path, &secrets).await?;
//! let repository = Arc::new(StoreRepository::new(Arc::new(store)));
//!
//! let session = ShoppingSession::start(repository, &config).await?;
//! session.apply(ShoppingAction::NameChanged("Bananas".to_string())).await?;
//! let mut handle = session.apply(ShoppingAction::AddRequested).await?;
//! handle.wait().await;
//!
//! for item in session.current_state().filtered_items() {
//!     println!("{} {}", item.category.glyph(), item.name);
//! }
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reducer;
pub mod repository;
pub mod session;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, ShoppingConfig};
pub use reducer::{ShoppingEnvironment, ShoppingReducer};
pub use repository::{ItemRepository, StoreRepository};
pub use session::{ShoppingSession, ShoppingStore};
pub use types::{EditDraft, ShoppingAction, ShoppingState, SortOption};
