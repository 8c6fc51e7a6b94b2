use chat_core::{ChatConfig, ChatMessage, Source};
use chat_engine::{
    ChatStorage, FileStore, KeyValueStore, MemoryStore, CONFIG_KEY, HISTORY_KEY,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_history() -> Vec<ChatMessage> {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    vec![
        ChatMessage::user("what is <rust>?", at),
        ChatMessage::bot(
            "A language.\n```\nfn main() {}\n```",
            vec![
                Source {
                    title: Some("Rust".to_string()),
                    url: "https://www.rust-lang.org".to_string(),
                    snippet: None,
                },
                Source {
                    title: None,
                    url: "https://doc.rust-lang.org".to_string(),
                    snippet: Some("The book".to_string()),
                },
            ],
            at + chrono::Duration::milliseconds(1500),
        ),
    ]
}

#[test]
fn history_round_trips_through_file_store() {
    let temp = TempDir::new().unwrap();
    let storage = ChatStorage::new(FileStore::new(temp.path().join("store")));

    assert!(storage.load_history().is_empty());

    let history = sample_history();
    storage.save_history(&history);
    assert!(temp.path().join("store").join("chatHistory.json").is_file());

    let reopened = ChatStorage::new(FileStore::new(temp.path().join("store")));
    assert_eq!(reopened.load_history(), history);
}

#[test]
fn corrupt_history_loads_as_empty() {
    let store = MemoryStore::new();
    store.insert_raw(HISTORY_KEY, "[{\"sender\":\"user\",");
    assert!(ChatStorage::new(store.clone()).load_history().is_empty());

    store.insert_raw(HISTORY_KEY, "{\"not\":\"a list\"}");
    assert!(ChatStorage::new(store).load_history().is_empty());
}

#[test]
fn rejected_writes_are_swallowed() {
    let store = MemoryStore::new();
    let storage = ChatStorage::new(store.clone());
    storage.save_history(&sample_history());

    store.set_reject_writes(true);
    storage.save_history(&[]);
    storage.save_config(&ChatConfig::default());

    assert!(store.raw(CONFIG_KEY).is_none());
    assert_eq!(storage.load_history(), sample_history());
}

#[test]
fn stored_config_overlays_defaults() {
    let store = MemoryStore::new();
    store.insert_raw(
        CONFIG_KEY,
        r#"{"BASE_API_URL":"https://chat.example.com","STREAMING":true,"UNKNOWN":1}"#,
    );
    let defaults = ChatConfig {
        max_context_docs: 7,
        ..ChatConfig::default()
    };

    let config = ChatStorage::new(store).load_config(&defaults);
    assert_eq!(config.base_api_url, "https://chat.example.com");
    assert!(config.streaming_enabled);
    assert_eq!(config.max_context_docs, 7);
    assert_eq!(config.health_endpoint_path, "/api/health");
}

#[test]
fn unreadable_config_yields_defaults() {
    let store = MemoryStore::new();
    store.insert_raw(CONFIG_KEY, r#"{"MAX_CONTEXT_DOCS":"three"}"#);
    let defaults = ChatConfig::default();
    assert_eq!(ChatStorage::new(store.clone()).load_config(&defaults), defaults);

    store.insert_raw(CONFIG_KEY, "nope");
    assert_eq!(ChatStorage::new(store).load_config(&defaults), defaults);
}

#[test]
fn saved_config_uses_snapshot_keys() {
    let store = MemoryStore::new();
    let config = ChatConfig {
        base_api_url: "https://chat.example.com".to_string(),
        ..ChatConfig::default()
    };
    ChatStorage::new(store.clone()).save_config(&config);

    let raw: serde_json::Value = serde_json::from_str(&store.raw(CONFIG_KEY).unwrap()).unwrap();
    assert_eq!(raw["BASE_API_URL"], "https://chat.example.com");
    assert_eq!(raw["MAX_CONTEXT_DOCS"], 3);
    assert_eq!(ChatStorage::new(store).load_config(&ChatConfig::default()), config);
}

#[test]
fn file_store_reports_missing_keys_as_none() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path());
    assert_eq!(store.get("absent").unwrap(), None);
    store.set("present", "1").unwrap();
    assert_eq!(store.get("present").unwrap().as_deref(), Some("1"));
}
