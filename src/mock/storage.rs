//! `chrome.storage.local` backed by an in-memory map.
//!
//! Values live for the lifetime of the [`StorageArea`]; nothing is written to
//! disk. Missing keys read back as `null`.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::diagnostics::Diagnostics;

/// Which keys a [`StorageArea::get`] call reads.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageSelector {
    /// The whole store.
    All,
    Key(String),
    Keys(Vec<String>),
    /// The given defaults, overlaid with stored values for the same keys.
    Defaults(Map<String, Value>),
}

impl From<&str> for StorageSelector {
    fn from(key: &str) -> Self {
        StorageSelector::Key(key.to_string())
    }
}

impl From<String> for StorageSelector {
    fn from(key: String) -> Self {
        StorageSelector::Key(key)
    }
}

impl From<Vec<String>> for StorageSelector {
    fn from(keys: Vec<String>) -> Self {
        StorageSelector::Keys(keys)
    }
}

impl From<Map<String, Value>> for StorageSelector {
    fn from(defaults: Map<String, Value>) -> Self {
        StorageSelector::Defaults(defaults)
    }
}

#[derive(Debug)]
pub struct StorageArea {
    name: &'static str,
    items: Mutex<HashMap<String, Value>>,
    diagnostics: Diagnostics,
}

impl StorageArea {
    pub fn new(name: &'static str, diagnostics: Diagnostics) -> Self {
        Self {
            name,
            items: Mutex::new(HashMap::new()),
            diagnostics,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the keys named by `selector`.
    pub fn get(&self, selector: impl Into<StorageSelector>) -> Map<String, Value> {
        let selector = selector.into();
        self.diagnostics.record("storage.get", format_args!("{selector:?}"));

        let items = self.items.lock();
        match selector {
            StorageSelector::All => items
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            StorageSelector::Key(key) => {
                let value = items.get(&key).cloned().unwrap_or(Value::Null);
                Map::from_iter([(key, value)])
            }
            StorageSelector::Keys(keys) => keys
                .into_iter()
                .map(|key| {
                    let value = items.get(&key).cloned().unwrap_or(Value::Null);
                    (key, value)
                })
                .collect(),
            StorageSelector::Defaults(mut defaults) => {
                for (key, value) in defaults.iter_mut() {
                    if let Some(stored) = items.get(key) {
                        *value = stored.clone();
                    }
                }
                defaults
            }
        }
    }

    /// Merge `entries` into the store, overwriting existing keys.
    pub fn set(&self, entries: Map<String, Value>) {
        if self.diagnostics.is_enabled() {
            self.diagnostics
                .record("storage.set", Value::Object(entries.clone()));
        }

        if entries.is_empty() {
            return;
        }
        self.items.lock().extend(entries);
    }

    /// Delete `keys`. Missing keys are ignored.
    pub fn remove<I>(&self, keys: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        self.diagnostics.record("storage.remove", format_args!("{keys:?}"));

        let mut items = self.items.lock();
        for key in &keys {
            items.remove(key);
        }
    }

    pub fn clear(&self) {
        self.diagnostics.record("storage.clear", "");
        self.items.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

/// The `chrome.storage` namespace.
#[derive(Debug)]
pub struct Storage {
    local: StorageArea,
}

impl Storage {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            local: StorageArea::new("local", diagnostics),
        }
    }

    pub fn local(&self) -> &StorageArea {
        &self.local
    }
}
