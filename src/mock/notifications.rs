//! `chrome.notifications`: acknowledgements only, nothing is displayed.

use serde_json::Value;
use uuid::Uuid;

use crate::diagnostics::Diagnostics;

#[derive(Debug)]
pub struct Notifications {
    diagnostics: Diagnostics,
}

impl Notifications {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// "Show" a notification and return its id, generating one when absent.
    pub fn create(&self, id: Option<&str>, options: &Value) -> String {
        let id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("notif-{}", Uuid::new_v4().simple()),
        };
        self.diagnostics
            .record("notifications.create", format_args!("{id} {options}"));
        id
    }

    /// Always reports the notification as cleared.
    pub fn clear(&self, id: &str) -> bool {
        self.diagnostics.record("notifications.clear", id);
        true
    }
}
