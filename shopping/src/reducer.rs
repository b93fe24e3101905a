//! Reducer logic for the shopping list.
//!
//! Field edits apply synchronously. Anything that touches the item store is
//! returned as an effect whose completion comes back as an event. Toggles and
//! edits are never applied optimistically: the list only changes when the
//! store's next snapshot arrives as `ItemsLoaded`.

use crate::repository::ItemRepository;
use crate::types::{
    ADD_FAILED_ERROR, DELETE_FAILED_ERROR, EDIT_FAILED_ERROR, EMPTY_NAME_ERROR, EditDraft,
    LOAD_FAILED_ERROR, ShoppingAction, ShoppingState, UPDATE_FAILED_ERROR,
};
use basket_core::item::NewItem;
use basket_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use futures::StreamExt;
use std::sync::Arc;

/// Environment dependencies for the shopping reducer
#[derive(Clone)]
pub struct ShoppingEnvironment {
    /// Where items are persisted
    pub repository: Arc<dyn ItemRepository>,
}

impl ShoppingEnvironment {
    /// Creates a new `ShoppingEnvironment`
    #[must_use]
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }
}

/// Reducer for the shopping list
#[derive(Clone, Debug, Default)]
pub struct ShoppingReducer;

impl ShoppingReducer {
    /// Creates a new `ShoppingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Trimmed name, or `None` if nothing is left
    fn validate_name(name: &str) -> Option<&str> {
        let trimmed = name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    fn observe(env: &ShoppingEnvironment) -> Effect<ShoppingAction> {
        let snapshots = env.repository.observe_items().map(|snapshot| match snapshot {
            Ok(items) => ShoppingAction::ItemsLoaded(items),
            Err(error) => {
                tracing::warn!(%error, "Item observation failed");
                ShoppingAction::ItemsLoadFailed(error.to_string())
            },
        });
        Effect::stream(snapshots)
    }

    fn add(env: &ShoppingEnvironment, item: NewItem) -> Effect<ShoppingAction> {
        let repository = Arc::clone(&env.repository);
        Effect::future(async move {
            match repository.add_item(item).await {
                Ok(added) => Some(ShoppingAction::ItemAdded(added)),
                Err(error) => {
                    tracing::warn!(%error, "Failed to add item");
                    Some(ShoppingAction::AddFailed(error.to_string()))
                },
            }
        })
    }
}

impl Reducer for ShoppingReducer {
    type State = ShoppingState;
    type Action = ShoppingAction;
    type Environment = ShoppingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            ShoppingAction::Start => smallvec![Self::observe(env)],

            ShoppingAction::NameChanged(name) => {
                state.pending_name = name;
                SmallVec::new()
            },

            ShoppingAction::CategorySelected(category) => {
                state.pending_category = category;
                SmallVec::new()
            },

            ShoppingAction::AddRequested => {
                let Some(name) = Self::validate_name(&state.pending_name) else {
                    state.error_message = Some(EMPTY_NAME_ERROR.to_string());
                    return SmallVec::new();
                };
                let item = NewItem::new(name, state.pending_category);
                smallvec![Self::add(env, item)]
            },

            ShoppingAction::TogglePurchased(item) => {
                let repository = Arc::clone(&env.repository);
                let toggled = item.toggled();
                smallvec![Effect::future(async move {
                    match repository.update_item(toggled.clone()).await {
                        Ok(()) => Some(ShoppingAction::ItemUpdated(toggled)),
                        Err(error) => {
                            tracing::warn!(%error, item_id = %toggled.id, "Failed to update item");
                            Some(ShoppingAction::UpdateFailed(error.to_string()))
                        },
                    }
                })]
            },

            ShoppingAction::Delete(item) => {
                let repository = Arc::clone(&env.repository);
                smallvec![Effect::future(async move {
                    match repository.delete_item(item.clone()).await {
                        Ok(()) => Some(ShoppingAction::ItemDeleted(item)),
                        Err(error) => {
                            tracing::warn!(%error, item_id = %item.id, "Failed to delete item");
                            Some(ShoppingAction::DeleteFailed(error.to_string()))
                        },
                    }
                })]
            },

            ShoppingAction::FilterChanged(category) => {
                state.filter_category = category;
                SmallVec::new()
            },

            ShoppingAction::SortChanged(option) => {
                state.sort_option = option;
                SmallVec::new()
            },

            ShoppingAction::EditRequested(item) => {
                state.edit = Some(EditDraft::new(item));
                SmallVec::new()
            },

            ShoppingAction::EditNameChanged(name) => {
                if let Some(draft) = state.edit.as_mut() {
                    draft.name = name;
                }
                SmallVec::new()
            },

            ShoppingAction::EditCategoryChanged(category) => {
                if let Some(draft) = state.edit.as_mut() {
                    draft.category = category;
                }
                SmallVec::new()
            },

            ShoppingAction::EditConfirmed => {
                let Some(draft) = state.edit.as_ref() else {
                    return SmallVec::new();
                };
                let Some(name) = Self::validate_name(&draft.name) else {
                    state.error_message = Some(EMPTY_NAME_ERROR.to_string());
                    return SmallVec::new();
                };

                let edited = draft.target.renamed(name, draft.category);
                let repository = Arc::clone(&env.repository);
                smallvec![Effect::future(async move {
                    match repository.update_item(edited.clone()).await {
                        Ok(()) => Some(ShoppingAction::EditSaved(edited)),
                        Err(error) => {
                            tracing::warn!(%error, item_id = %edited.id, "Failed to edit item");
                            Some(ShoppingAction::EditFailed(error.to_string()))
                        },
                    }
                })]
            },

            ShoppingAction::EditDismissed => {
                state.edit = None;
                SmallVec::new()
            },

            ShoppingAction::ErrorDismissed => {
                state.error_message = None;
                SmallVec::new()
            },

            // ========== Events ==========
            ShoppingAction::ItemsLoaded(items) => {
                state.items = items;
                SmallVec::new()
            },

            ShoppingAction::ItemsLoadFailed(_) => {
                state.error_message = Some(LOAD_FAILED_ERROR.to_string());
                SmallVec::new()
            },

            ShoppingAction::ItemAdded(_) => {
                state.pending_name.clear();
                SmallVec::new()
            },

            ShoppingAction::AddFailed(_) => {
                state.error_message = Some(ADD_FAILED_ERROR.to_string());
                SmallVec::new()
            },

            ShoppingAction::UpdateFailed(_) => {
                state.error_message = Some(UPDATE_FAILED_ERROR.to_string());
                SmallVec::new()
            },

            ShoppingAction::DeleteFailed(_) => {
                state.error_message = Some(DELETE_FAILED_ERROR.to_string());
                SmallVec::new()
            },

            ShoppingAction::EditSaved(item) => {
                // A newer dialog for another item stays open
                if state.edit.as_ref().is_some_and(|draft| draft.target.id == item.id) {
                    state.edit = None;
                }
                SmallVec::new()
            },

            ShoppingAction::EditFailed(_) => {
                state.error_message = Some(EDIT_FAILED_ERROR.to_string());
                SmallVec::new()
            },

            // Confirmations only; the store echo carries the change
            ShoppingAction::ItemUpdated(_) | ShoppingAction::ItemDeleted(_) => SmallVec::new(),
        }
    }
}
