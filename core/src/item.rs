//! Shopping items and their categories.
//!
//! An [`Item`] only ever gets its [`ItemId`] from an item store; code that
//! creates items hands the store a [`NewItem`] instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Store-assigned identifier of an item.
///
/// Identifiers are numeric and increase with creation order, so a higher id
/// means a more recently created item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(i64);

impl ItemId {
    /// Creates an `ItemId` from its raw value
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Error returned when a category name is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown category: {0}")]
pub struct ParseCategoryError(String);

/// Closed set of grocery categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Dairy
    #[default]
    Milk,
    /// Vegetables
    Vegetables,
    /// Fruits
    Fruits,
    /// Breads and bakery
    Breads,
    /// Meats
    Meats,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Self; 5] = [
        Self::Milk,
        Self::Vegetables,
        Self::Fruits,
        Self::Breads,
        Self::Meats,
    ];

    /// Stable enumeration name, used for persistence and category sorting
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Milk => "MILK",
            Self::Vegetables => "VEGETABLES",
            Self::Fruits => "FRUITS",
            Self::Breads => "BREADS",
            Self::Meats => "MEATS",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Milk => "Milk",
            Self::Vegetables => "Vegetables",
            Self::Fruits => "Fruits",
            Self::Breads => "Breads",
            Self::Meats => "Meats",
        }
    }

    /// Glyph shown next to the label
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Milk => "\u{1F95B}",
            Self::Vegetables => "\u{1F966}",
            Self::Fruits => "\u{1F34E}",
            Self::Breads => "\u{1F35E}",
            Self::Meats => "\u{1F969}",
        }
    }

    /// Lenient decoding for stored values.
    ///
    /// Matches enumeration names case-insensitively. Anything unrecognised
    /// decodes to the default category instead of failing, so a row written by
    /// a newer schema never makes the whole list unreadable.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Strict parse accepting the enumeration name or label, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| {
                category.name().eq_ignore_ascii_case(trimmed)
                    || category.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// An item that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name, already trimmed and non-empty
    pub name: String,
    /// Category of the item
    pub category: Category,
}

impl NewItem {
    /// Creates a new unsaved item
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// A stored shopping item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identity assigned by the store
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Category of the item
    pub category: Category,
    /// Whether the item has been bought
    pub purchased: bool,
}

impl Item {
    /// Creates an item with an explicit identity
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, category: Category, purchased: bool) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            purchased,
        }
    }

    /// Copy of this item with the purchased flag inverted
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            purchased: !self.purchased,
            ..self.clone()
        }
    }

    /// Copy of this item with a new name and category, identity and flag unchanged
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Category::from_name("fruits"), Category::Fruits);
        assert_eq!(Category::from_name("MEATS"), Category::Meats);
        assert_eq!(Category::from_name("Vegetables"), Category::Vegetables);
    }

    #[test]
    fn unknown_names_decode_to_default() {
        assert_eq!(Category::from_name("SNACKS"), Category::Milk);
        assert_eq!(Category::from_name(""), Category::Milk);
    }

    #[test]
    fn strict_parse_rejects_unknown_names() {
        assert!("snacks".parse::<Category>().is_err());
        assert_eq!(" breads ".parse::<Category>(), Ok(Category::Breads));
    }

    #[test]
    fn names_round_trip_through_from_name() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), category);
        }
    }

    #[test]
    fn serde_uses_enumeration_names() {
        let json = serde_json::to_string(&Category::Vegetables).unwrap();
        assert_eq!(json, "\"VEGETABLES\"");
    }

    #[test]
    fn toggled_keeps_identity() {
        let item = Item::new(ItemId::new(1), "Milk", Category::Milk, false);
        let toggled = item.toggled();
        assert_eq!(toggled.id, item.id);
        assert!(toggled.purchased);
        assert_eq!(toggled.name, "Milk");
    }

    #[test]
    fn renamed_keeps_purchased_flag() {
        let item = Item::new(ItemId::new(7), "Apples", Category::Fruits, true);
        let renamed = item.renamed("Pears", Category::Fruits);
        assert_eq!(renamed.id, ItemId::new(7));
        assert_eq!(renamed.name, "Pears");
        assert!(renamed.purchased);
    }

    #[test]
    fn glyphs_and_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            Category::ALL.iter().map(|c| c.label()).collect();
        let glyphs: std::collections::HashSet<_> =
            Category::ALL.iter().map(|c| c.glyph()).collect();
        assert_eq!(labels.len(), Category::ALL.len());
        assert_eq!(glyphs.len(), Category::ALL.len());
    }
}
