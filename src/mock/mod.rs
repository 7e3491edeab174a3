//! The mocked `chrome` surface.
//!
//! # Architecture
//!
//! ```text
//! Chrome
//! ├── runtime: Arc<Runtime>          (onMessage channel, response tokens)
//! ├── storage: Storage { local }     (in-memory key/value store)
//! ├── tabs: Tabs                     (fixed records, tab-tagged send via runtime)
//! ├── alarms: Alarms                 (one-shot timers, onAlarm channel)
//! ├── context_menus: ContextMenus    (onClicked channel, manual click trigger)
//! ├── notifications: Notifications
//! └── windows: Windows
//! ```
//!
//! Every event-bearing namespace is built on [`crate::event::EventChannel`].
//! Stateless namespaces only shape literal records.

pub mod alarms;
pub mod context_menus;
pub mod notifications;
pub mod runtime;
pub mod storage;
pub mod tabs;
pub mod windows;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::environment::Location;

pub use alarms::{Alarm, AlarmArgs, AlarmCreateInfo, AlarmSpec, Alarms};
pub use context_menus::{ContextMenus, MenuClick, MenuItemProperties};
pub use notifications::Notifications;
pub use runtime::{fallback_response, MessageEvent, MessageSender, Responder, Runtime};
pub use storage::{Storage, StorageArea, StorageSelector};
pub use tabs::{Tab, TabCreateProperties, Tabs};
pub use windows::{Window, Windows};

/// The installed extension API surface.
#[derive(Debug)]
pub struct Chrome {
    runtime: Arc<Runtime>,
    storage: Storage,
    tabs: Tabs,
    alarms: Alarms,
    context_menus: ContextMenus,
    notifications: Notifications,
    windows: Windows,
    diagnostics: Diagnostics,
}

impl Chrome {
    /// Build every namespace from `config`, for a page at `location` if known.
    pub fn new(config: &Config, location: Option<&Location>) -> Self {
        let diagnostics = Diagnostics::new(&config.diagnostics);
        let runtime = Arc::new(Runtime::new(&config.runtime, location, diagnostics.clone()));

        Self {
            storage: Storage::new(diagnostics.clone()),
            tabs: Tabs::new(Arc::clone(&runtime), diagnostics.clone()),
            alarms: Alarms::new(&config.alarms, diagnostics.clone()),
            context_menus: ContextMenus::new(&config.context_menus, diagnostics.clone()),
            notifications: Notifications::new(diagnostics.clone()),
            windows: Windows::new(diagnostics.clone()),
            runtime,
            diagnostics,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn tabs(&self) -> &Tabs {
        &self.tabs
    }

    pub fn alarms(&self) -> &Alarms {
        &self.alarms
    }

    pub fn context_menus(&self) -> &ContextMenus {
        &self.context_menus
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Pseudo-random number in `0..bound` for ids a real host would assign.
pub(crate) fn pseudo_random_below(bound: u32) -> u32 {
    if bound == 0 {
        return 0;
    }
    (Uuid::new_v4().as_u128() % u128::from(bound)) as u32
}
