//! `chrome.tabs`: fixed-shape tab records and tab-addressed messaging.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pseudo_random_below;
use super::runtime::Runtime;
use crate::diagnostics::Diagnostics;

/// Key added to messages sent through [`Tabs::send_message`].
pub const TARGET_TAB_KEY: &str = "__toTabId";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub active: bool,
}

/// Properties accepted by `tabs.create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabCreateProperties {
    pub title: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug)]
pub struct Tabs {
    runtime: Arc<Runtime>,
    diagnostics: Diagnostics,
}

impl Tabs {
    pub fn new(runtime: Arc<Runtime>, diagnostics: Diagnostics) -> Self {
        Self {
            runtime,
            diagnostics,
        }
    }

    /// Every query matches the same single active tab.
    pub fn query(&self, query_info: &Value) -> Vec<Tab> {
        self.diagnostics.record("tabs.query", query_info);
        vec![Tab {
            id: 1,
            title: "Mock tab".to_string(),
            url: "https://example.com".to_string(),
            active: true,
        }]
    }

    pub fn get(&self, id: i64) -> Tab {
        self.diagnostics.record("tabs.get", id);
        Tab {
            id,
            title: format!("Mock tab {id}"),
            url: format!("https://example.com/{id}"),
            active: id == 1,
        }
    }

    pub fn create(&self, properties: TabCreateProperties) -> Tab {
        self.diagnostics
            .record("tabs.create", format_args!("{properties:?}"));
        Tab {
            id: i64::from(pseudo_random_below(1000)) + 2,
            title: properties.title.unwrap_or_else(|| "New Tab".to_string()),
            url: properties.url.unwrap_or_else(|| "about:blank".to_string()),
            active: properties.active.unwrap_or(false),
        }
    }

    /// Send a message addressed to `tab_id` and return its response.
    ///
    /// The address is only a tag: every `runtime.onMessage` listener sees the
    /// message, whatever tab it names.
    pub fn send_message(&self, tab_id: i64, message: Value) -> Value {
        self.diagnostics
            .record("tabs.sendMessage", format_args!("{tab_id} {message}"));
        self.runtime.send_message(tag_for_tab(tab_id, message))
    }

    /// Fire-and-forget variant of [`Tabs::send_message`].
    pub fn post_message(&self, tab_id: i64, message: Value) {
        self.diagnostics
            .record("tabs.sendMessage", format_args!("{tab_id} {message}"));
        self.runtime.post_message(tag_for_tab(tab_id, message));
    }
}

/// Build `{ "__toTabId": tab_id, ...message }`.
///
/// Fields of an object message override the tag. Other messages are kept
/// under `"payload"`.
pub fn tag_for_tab(tab_id: i64, message: Value) -> Value {
    let mut tagged = Map::new();
    tagged.insert(TARGET_TAB_KEY.to_string(), Value::from(tab_id));
    match message {
        Value::Object(fields) => tagged.extend(fields),
        Value::Null => {}
        other => {
            tagged.insert("payload".to_string(), other);
        }
    }
    Value::Object(tagged)
}
