//! Best-effort snapshot persistence for the chat history and configuration.
//!
//! Every failure is logged and swallowed: loads fall back to empty history or the
//! caller's defaults, saves are dropped.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chat_core::{ChatConfig, ChatMessage};
use chat_logging::{chat_debug, chat_warn};
use serde_json::Value;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

pub const HISTORY_KEY: &str = "chatHistory";
pub const CONFIG_KEY: &str = "chatConfig";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write snapshot: {0}")]
    Write(#[from] PersistError),
    #[error("snapshot (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store rejected write to {0}")]
    Rejected(String),
}

/// String key-value store holding whole snapshots.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `{key}.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    writer: AtomicFileWriter,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir.into()),
        }
    }

    fn filename(key: &str) -> String {
        format!("{key}.json")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.writer.dir().join(Self::filename(key));
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writer.write(&Self::filename(key), value)?;
        Ok(())
    }
}

/// In-process store. Clones share entries, so a test can inspect what a controller wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail, like a browser store over its quota.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Rejected(key.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(StorageError::Rejected(key.to_string()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Rejected(key.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persistence adapter used by the controller.
pub struct ChatStorage {
    store: Box<dyn KeyValueStore>,
}

impl ChatStorage {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Loads the history snapshot; empty when absent or unreadable.
    pub fn load_history(&self) -> Vec<ChatMessage> {
        match self.try_load_history() {
            Ok(history) => history,
            Err(err) => {
                chat_warn!("Ignoring stored chat history: {}", err);
                Vec::new()
            }
        }
    }

    fn try_load_history(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let Some(raw) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        let history: Vec<ChatMessage> = serde_json::from_str(&raw)?;
        chat_debug!("Loaded {} stored chat messages", history.len());
        Ok(history.into_iter().map(ChatMessage::normalized).collect())
    }

    pub fn save_history(&self, history: &[ChatMessage]) {
        let result = serde_json::to_string(history)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(HISTORY_KEY, &json));
        if let Err(err) = result {
            chat_warn!("Dropping chat history snapshot: {}", err);
        }
    }

    /// Loads the stored configuration over `defaults`; keys missing from the snapshot keep
    /// their default value, and any failure yields `defaults` unchanged.
    pub fn load_config(&self, defaults: &ChatConfig) -> ChatConfig {
        match self.try_load_config(defaults) {
            Ok(config) => config,
            Err(err) => {
                chat_warn!("Ignoring stored chat config: {}", err);
                defaults.clone()
            }
        }
    }

    fn try_load_config(&self, defaults: &ChatConfig) -> Result<ChatConfig, StorageError> {
        let Some(raw) = self.store.get(CONFIG_KEY)? else {
            return Ok(defaults.clone());
        };
        let mut merged = serde_json::to_value(defaults)?;
        if let (Value::Object(base), Value::Object(stored)) =
            (&mut merged, serde_json::from_str::<Value>(&raw)?)
        {
            base.extend(stored);
        }
        Ok(serde_json::from_value(merged)?)
    }

    pub fn save_config(&self, config: &ChatConfig) {
        let result = serde_json::to_string(config)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(CONFIG_KEY, &json));
        if let Err(err) = result {
            chat_warn!("Dropping chat config snapshot: {}", err);
        }
    }
}
