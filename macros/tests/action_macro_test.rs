//! Tests for #[derive(Action)] macro

use basket_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum ListAction {
    #[command]
    NameChanged(String),

    #[command]
    AddRequested,

    #[command]
    Rename {
        id: i64,
        name: String,
    },

    #[event]
    ItemAdded {
        id: i64,
    },

    #[event]
    Loaded(Vec<i64>),

    #[event]
    Failed,
}

#[derive(Action, Clone, Debug)]
enum OnlyCommands {
    #[command]
    Ping,
}

#[test]
fn test_is_command() {
    assert!(ListAction::AddRequested.is_command());
    assert!(ListAction::NameChanged("Milk".to_string()).is_command());
    assert!(
        ListAction::Rename {
            id: 1,
            name: "Eggs".to_string()
        }
        .is_command()
    );
    assert!(!ListAction::AddRequested.is_event());
}

#[test]
fn test_is_event() {
    assert!(ListAction::ItemAdded { id: 1 }.is_event());
    assert!(ListAction::Loaded(vec![1, 2]).is_event());
    assert!(ListAction::Failed.is_event());
    assert!(!ListAction::Failed.is_command());
}

#[test]
fn test_name_covers_every_shape() {
    assert_eq!(ListAction::NameChanged(String::new()).name(), "NameChanged");
    assert_eq!(ListAction::AddRequested.name(), "AddRequested");
    assert_eq!(ListAction::ItemAdded { id: 9 }.name(), "ItemAdded");
    assert_eq!(ListAction::Loaded(Vec::new()).name(), "Loaded");
}

#[test]
fn test_enum_without_events() {
    assert!(OnlyCommands::Ping.is_command());
    assert!(!OnlyCommands::Ping.is_event());
    assert_eq!(OnlyCommands::Ping.name(), "Ping");
}
