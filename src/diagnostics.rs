//! Diagnostic output for mocked calls.
//!
//! Every mutating or notable call records one `tracing` event under the
//! `chromock` target. The output is observable but carries no contract, and
//! can be switched off through [`DiagnosticsConfig`].

use std::fmt::Display;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DiagnosticsConfig;

/// Target used for every chromock tracing event.
pub const TARGET: &str = "chromock";

/// Cheap, cloneable handle shared by every namespace.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    enabled: bool,
    prefix: Arc<str>,
}

impl Diagnostics {
    pub fn new(config: &DiagnosticsConfig) -> Self {
        Self {
            enabled: config.enabled,
            prefix: Arc::from(config.prefix.as_str()),
        }
    }

    /// A handle that records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            prefix: Arc::from(""),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Record a call to `operation` with a free-form detail.
    pub fn record(&self, operation: &str, detail: impl Display) {
        if !self.enabled {
            return;
        }
        let detail = detail.to_string();
        tracing::info!(
            target: TARGET,
            operation,
            detail = detail.as_str(),
            "{} {} {}",
            self.prefix,
            operation,
            detail
        );
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(&DiagnosticsConfig::default())
    }
}

/// Install a global subscriber reading `RUST_LOG`, falling back to `default_filter`.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
