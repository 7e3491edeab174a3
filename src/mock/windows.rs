//! `chrome.windows`: current window and window creation stubs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pseudo_random_below;
use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Numeric unless the caller supplied some other `id`.
    pub id: Value,
    /// Everything besides the id, e.g. `focused`, `state`, `type`.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug)]
pub struct Windows {
    diagnostics: Diagnostics,
}

impl Windows {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub fn get_current(&self) -> Window {
        let mut properties = Map::new();
        properties.insert("focused".to_string(), Value::Bool(true));
        properties.insert("state".to_string(), Value::from("normal"));
        properties.insert("type".to_string(), Value::from("normal"));
        Window {
            id: Value::from(1),
            properties,
        }
    }

    /// Create a window with a pseudo-random id. An `id` in `options` wins,
    /// whatever its type.
    pub fn create(&self, mut options: Map<String, Value>) -> Window {
        let id = options
            .remove("id")
            .unwrap_or_else(|| Value::from(pseudo_random_below(10_000)));
        let window = Window {
            id,
            properties: options,
        };
        self.diagnostics
            .record("windows.create", format_args!("{window:?}"));
        window
    }
}
