//! Command-line shopping list.
//!
//! A thin presentation surface over [`ShoppingSession`]: every command opens
//! the encrypted database, waits for the first snapshot, applies its actions,
//! and prints the outcome.

use anyhow::{Context, bail};
use basket_core::item::{Category, Item, ItemId};
use basket_sqlite::{FileSecretStore, SqliteItemStore};
use clap::{Parser, Subcommand};
use shopping::{ShoppingAction, ShoppingConfig, ShoppingSession, SortOption, StoreRepository};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the first snapshot
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "basket")]
#[command(about = "Grocery list kept in an encrypted local database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an item
    Add {
        /// Item name
        name: String,
        /// Category (milk, vegetables, fruits, breads, meats)
        #[arg(short, long, default_value = "milk", value_parser = parse_category)]
        category: Category,
    },
    /// Show the list
    List {
        /// Only show this category
        #[arg(short, long, value_parser = parse_category)]
        filter: Option<Category>,
        /// Ordering (default, a-z, category, status)
        #[arg(short, long, default_value = "default", value_parser = parse_sort)]
        sort: SortOption,
    },
    /// Flip an item between purchased and not purchased
    Toggle {
        /// Item id
        id: i64,
    },
    /// Rename or recategorize an item
    Edit {
        /// Item id
        id: i64,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Remove an item
    Delete {
        /// Item id
        id: i64,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse().map_err(|e: basket_core::item::ParseCategoryError| e.to_string())
}

fn parse_sort(value: &str) -> Result<SortOption, String> {
    match value.trim().to_lowercase().as_str() {
        "default" => Ok(SortOption::Default),
        "a-z" | "alphabetical" => Ok(SortOption::Alphabetical),
        "category" => Ok(SortOption::Category),
        "status" => Ok(SortOption::Status),
        other => Err(format!("Unknown sort option: {other}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // BASKET_* variables, with .env (if present) filling the gaps
    let config = ShoppingConfig::from_env_file(".env")?;
    config.validate()?;
    shopping::telemetry::init(&config.log_filter)?;

    let secrets = FileSecretStore::new(&config.secret_path);
    let store = SqliteItemStore::open(&config.database_path, &secrets)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let repository = Arc::new(StoreRepository::new(Arc::new(store)));

    let session = ShoppingSession::start_and_load(repository, &config, LOAD_TIMEOUT).await?;
    let outcome = run(&session, cli.command).await;
    session.shutdown().await?;
    outcome
}

async fn run(session: &ShoppingSession, command: Command) -> anyhow::Result<()> {
    fail_on_error(session)?;

    match command {
        Command::Add { name, category } => {
            session.apply(ShoppingAction::NameChanged(name)).await?;
            session.apply(ShoppingAction::CategorySelected(category)).await?;
            settle(session, ShoppingAction::AddRequested).await?;
            println!("Added.");
        },
        Command::List { filter, sort } => {
            session.apply(ShoppingAction::FilterChanged(filter)).await?;
            session.apply(ShoppingAction::SortChanged(sort)).await?;
            print_list(session);
        },
        Command::Toggle { id } => {
            let item = find(session, id)?;
            settle(session, ShoppingAction::TogglePurchased(item)).await?;
            println!("Toggled {id}.");
        },
        Command::Edit { id, name, category } => {
            let item = find(session, id)?;
            session.apply(ShoppingAction::EditRequested(item)).await?;
            if let Some(name) = name {
                session.apply(ShoppingAction::EditNameChanged(name)).await?;
            }
            if let Some(category) = category {
                session.apply(ShoppingAction::EditCategoryChanged(category)).await?;
            }
            settle(session, ShoppingAction::EditConfirmed).await?;
            println!("Saved {id}.");
        },
        Command::Delete { id } => {
            let item = find(session, id)?;
            settle(session, ShoppingAction::Delete(item)).await?;
            println!("Deleted {id}.");
        },
    }

    Ok(())
}

/// Apply a persisted action and wait until its completion has been reduced
async fn settle(session: &ShoppingSession, action: ShoppingAction) -> anyhow::Result<()> {
    let mut handle = session.apply(action).await?;
    handle.wait_with_timeout(LOAD_TIMEOUT).await?;
    fail_on_error(session)
}

fn fail_on_error(session: &ShoppingSession) -> anyhow::Result<()> {
    if let Some(message) = session.current_state().error_message {
        bail!(message);
    }
    Ok(())
}

fn find(session: &ShoppingSession, id: i64) -> anyhow::Result<Item> {
    let id = ItemId::new(id);
    session
        .current_state()
        .items
        .into_iter()
        .find(|item| item.id == id)
        .with_context(|| format!("No item with id {id}"))
}

fn print_list(session: &ShoppingSession) {
    let state = session.current_state();
    let items = state.filtered_items();

    if items.is_empty() {
        println!("Nothing on the list.");
        return;
    }

    for item in &items {
        let mark = if item.purchased { "x" } else { " " };
        println!(
            "[{mark}] {:>4}  {} {:<12} {}",
            item.id,
            item.category.glyph(),
            item.category.label(),
            item.name
        );
    }
    println!("\n{} of {} remaining", state.remaining_count(), state.items.len());
}
