//! `chrome.contextMenus`, with a manual trigger to simulate clicks in tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::ContextMenusConfig;
use crate::diagnostics::Diagnostics;
use crate::event::EventChannel;

/// Properties accepted by `contextMenus.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItemProperties {
    pub id: Option<String>,
    pub title: Option<String>,
    pub contexts: Vec<String>,
    /// Any other property, kept as given.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `contextMenus.onClicked`.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuClick {
    /// `{ "menuItemId": ..., ...info }`
    pub info: Map<String, Value>,
    pub tab: Value,
}

impl MenuClick {
    pub fn menu_item_id(&self) -> Option<&str> {
        self.info.get("menuItemId").and_then(Value::as_str)
    }
}

pub struct ContextMenus {
    default_item_id: String,
    on_clicked: EventChannel<MenuClick>,
    diagnostics: Diagnostics,
}

impl ContextMenus {
    pub fn new(config: &ContextMenusConfig, diagnostics: Diagnostics) -> Self {
        Self {
            default_item_id: config.default_item_id.clone(),
            on_clicked: EventChannel::new("contextMenus.onClicked"),
            diagnostics,
        }
    }

    pub fn on_clicked(&self) -> &EventChannel<MenuClick> {
        &self.on_clicked
    }

    /// Register a menu item and return its id.
    pub fn create(&self, properties: MenuItemProperties) -> String {
        self.diagnostics
            .record("contextMenus.create", format_args!("{properties:?}"));
        properties
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.default_item_id.clone())
    }

    /// Simulate a user clicking `menu_item_id`. The tab defaults to `{ "id": 1 }`.
    pub fn click(&self, menu_item_id: &str, info: Map<String, Value>, tab: Option<Value>) {
        let mut click_info = Map::new();
        click_info.insert("menuItemId".to_string(), Value::from(menu_item_id));
        click_info.extend(info);

        let click = MenuClick {
            info: click_info,
            tab: tab.unwrap_or_else(|| json!({ "id": 1 })),
        };
        self.on_clicked.emit(&click);
    }
}

impl fmt::Debug for ContextMenus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMenus")
            .field("default_item_id", &self.default_item_id)
            .field("on_clicked", &self.on_clicked)
            .finish()
    }
}
