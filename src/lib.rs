//! chromock - an in-process stand-in for the Chrome extension API.
//!
//! Code written against `chrome.*` can run and be tested without a browser:
//! chromock installs a surface with the same namespaces and call shapes into
//! an explicit [`Environment`], unless one is already bound there.
//!
//! # Architecture
//!
//! The library is organized into these main modules:
//!
//! - [`event`] - Generic subscribe/unsubscribe/emit channel used by every event
//! - [`mock`] - The namespaces (runtime, storage, tabs, alarms, contextMenus,
//!   notifications, windows) composed into [`Chrome`]
//! - [`environment`] - Ambient environment and the idempotent install guard
//! - [`compat`] - Callback-style entry points taking JavaScript argument shapes
//! - [`config`] - Configuration loading and management
//! - [`diagnostics`] - Prefixed diagnostic output via `tracing`
//!
//! # Example
//!
//! ```
//! use chromock::{install, Config, Environment};
//! use chromock::event::listener;
//! use chromock::mock::MessageEvent;
//! use serde_json::json;
//!
//! let mut env = Environment::new();
//! assert!(install(&mut env, &Config::default()));
//!
//! let chrome = env.chrome().unwrap();
//! chrome.runtime().on_message().subscribe(listener(|event: &MessageEvent| {
//!     event.respond(json!({ "value": 42 }));
//! }));
//!
//! let response = chrome.runtime().send_message(json!({ "op": "ping" }));
//! assert_eq!(response, json!({ "value": 42 }));
//! ```

pub mod compat;
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod event;
pub mod mock;

mod error;

// Re-export commonly used types for convenience
pub use compat::CallbackApi;
pub use config::Config;
pub use environment::{global_chrome, install, install_global, Binding, Environment, Location};
pub use error::{ChromockError, ChromockResult};
pub use event::{EventChannel, Listener};
pub use mock::Chrome;
