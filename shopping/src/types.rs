//! Domain types for the shopping list.
//!
//! The state holds the authoritative item collection exactly as the item
//! store delivered it, plus the input fields the presentation edits. Every
//! ordering or filtering the user sees is derived on read by
//! [`ShoppingState::filtered_items`].

use basket_core::item::{Category, Item};
use basket_macros::Action;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Error shown when an add or edit is confirmed with a blank name
pub const EMPTY_NAME_ERROR: &str = "Item name cannot be empty";
/// Error shown when the store rejects an add
pub const ADD_FAILED_ERROR: &str = "Failed to add item";
/// Error shown when the store rejects a purchased toggle
pub const UPDATE_FAILED_ERROR: &str = "Failed to update item";
/// Error shown when the store rejects a delete
pub const DELETE_FAILED_ERROR: &str = "Failed to delete item";
/// Error shown when the store rejects an edit
pub const EDIT_FAILED_ERROR: &str = "Failed to edit item";
/// Error shown when the observation stream reports a failure
pub const LOAD_FAILED_ERROR: &str = "Failed to load items";

/// Ordering applied to the derived view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOption {
    /// Unpurchased first, newest first within each group
    #[default]
    Default,
    /// Case-insensitive by name
    Alphabetical,
    /// By category enumeration name
    Category,
    /// Unpurchased first, otherwise unchanged
    Status,
}

impl SortOption {
    /// Every option, in menu order
    pub const ALL: [Self; 4] = [
        Self::Default,
        Self::Alphabetical,
        Self::Category,
        Self::Status,
    ];

    /// Name shown in menus
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Alphabetical => "A-Z",
            Self::Category => "Category",
            Self::Status => "Status",
        }
    }

    fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            Self::Default => a
                .purchased
                .cmp(&b.purchased)
                .then_with(|| b.id.cmp(&a.id)),
            Self::Alphabetical => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Category => a.category.name().cmp(b.category.name()),
            Self::Status => a.purchased.cmp(&b.purchased),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An item being edited, with the fields as currently typed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDraft {
    /// The item as it was when editing began
    pub target: Item,
    /// Name being typed
    pub name: String,
    /// Category being chosen
    pub category: Category,
}

impl EditDraft {
    /// Start editing `item` with its current values
    #[must_use]
    pub fn new(item: Item) -> Self {
        Self {
            name: item.name.clone(),
            category: item.category,
            target: item,
        }
    }
}

/// Full state of one shopping list session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingState {
    /// Items in the store's natural order
    pub items: Vec<Item>,
    /// Text in the add field
    pub pending_name: String,
    /// Category chosen for the next add
    pub pending_category: Category,
    /// Only show items of this category
    pub filter_category: Option<Category>,
    /// Ordering of the derived view
    pub sort_option: SortOption,
    /// Open edit dialog, if any
    pub edit: Option<EditDraft>,
    /// Error waiting to be shown
    pub error_message: Option<String>,
}

impl ShoppingState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items to display: filtered by category, then sorted.
    ///
    /// Recomputed on every call. Sorting is stable, so items that compare
    /// equal keep their relative order from [`items`](Self::items).
    #[must_use]
    pub fn filtered_items(&self) -> Vec<Item> {
        let mut visible: Vec<Item> = self
            .items
            .iter()
            .filter(|item| self.filter_category.is_none_or(|c| item.category == c))
            .cloned()
            .collect();
        let sort = self.sort_option;
        visible.sort_by(|a, b| sort.compare(a, b));
        visible
    }

    /// Number of items not yet purchased
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.items.iter().filter(|item| !item.purchased).count()
    }

    /// Whether an edit dialog is open
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.edit.is_some()
    }
}

/// Actions representing user intents and store completions
///
/// Commands come from the presentation. Events report what the item store
/// did; they are produced by effects and fed back into the reducer. Failure
/// events carry the underlying error as text so actions stay `Clone`.
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShoppingAction {
    // ========== Commands ==========
    /// Command: Subscribe to the item collection
    #[command]
    Start,

    /// Command: The add field changed
    #[command]
    NameChanged(String),

    /// Command: A category was chosen for the next add
    #[command]
    CategorySelected(Category),

    /// Command: Add the pending item
    #[command]
    AddRequested,

    /// Command: Flip an item's purchased flag
    #[command]
    TogglePurchased(Item),

    /// Command: Remove an item
    #[command]
    Delete(Item),

    /// Command: Show only one category, or everything
    #[command]
    FilterChanged(Option<Category>),

    /// Command: Change the ordering
    #[command]
    SortChanged(SortOption),

    /// Command: Open the edit dialog for an item
    #[command]
    EditRequested(Item),

    /// Command: The edit name field changed
    #[command]
    EditNameChanged(String),

    /// Command: The edit category changed
    #[command]
    EditCategoryChanged(Category),

    /// Command: Save the edit
    #[command]
    EditConfirmed,

    /// Command: Close the edit dialog without saving
    #[command]
    EditDismissed,

    /// Command: Hide the current error
    #[command]
    ErrorDismissed,

    // ========== Events ==========
    /// Event: The store delivered a snapshot
    #[event]
    ItemsLoaded(Vec<Item>),

    /// Event: The observation stream reported a failure
    #[event]
    ItemsLoadFailed(String),

    /// Event: The store added an item
    #[event]
    ItemAdded(Item),

    /// Event: The store rejected an add
    #[event]
    AddFailed(String),

    /// Event: The store applied a purchased toggle
    #[event]
    ItemUpdated(Item),

    /// Event: The store rejected a purchased toggle
    #[event]
    UpdateFailed(String),

    /// Event: The store removed an item
    #[event]
    ItemDeleted(Item),

    /// Event: The store rejected a delete
    #[event]
    DeleteFailed(String),

    /// Event: The store applied an edit
    #[event]
    EditSaved(Item),

    /// Event: The store rejected an edit
    #[event]
    EditFailed(String),
}
