//! `chrome.runtime`: message round trips between a sender and its listeners.
//!
//! Every [`Runtime::send_message`] produces exactly one response. The first
//! listener to call [`Responder::respond`] wins; if nobody responds, the
//! sender receives `{ "ok": true, "echo": <message> }`. The response is handed
//! back after every listener has run.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::RuntimeConfig;
use crate::diagnostics::Diagnostics;
use crate::environment::Location;
use crate::event::EventChannel;

/// Who sent a message, as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    pub id: String,
    /// Location of the sending page, empty when unknown.
    pub url: String,
}

#[derive(Debug)]
enum TokenState {
    Pending,
    Responded(Value),
    Consumed,
}

/// Single-use marker for one outgoing message.
#[derive(Debug)]
struct ResponseToken {
    state: Mutex<TokenState>,
}

impl ResponseToken {
    fn new() -> Self {
        Self {
            state: Mutex::new(TokenState::Pending),
        }
    }

    fn respond(&self, value: Value) -> bool {
        let mut state = self.state.lock();
        match *state {
            TokenState::Pending => {
                *state = TokenState::Responded(value);
                true
            }
            _ => false,
        }
    }

    /// Close the token, yielding the listener response if there was one.
    fn finish(&self) -> Option<Value> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, TokenState::Consumed) {
            TokenState::Responded(value) => Some(value),
            _ => None,
        }
    }
}

/// Handle listeners use to answer a message.
#[derive(Clone, Default)]
pub struct Responder {
    token: Option<Arc<ResponseToken>>,
}

impl Responder {
    fn new(token: Arc<ResponseToken>) -> Self {
        Self { token: Some(token) }
    }

    /// A responder for a message nobody waits on.
    fn detached() -> Self {
        Self { token: None }
    }

    /// Answer the message. Returns whether this value will reach the sender.
    ///
    /// Only the first call for a message counts. Calls after the send has
    /// completed, and calls for fire-and-forget messages, return `false`.
    pub fn respond(&self, value: Value) -> bool {
        match &self.token {
            Some(token) => token.respond(value),
            None => false,
        }
    }

    /// Whether the sender is waiting for a response.
    pub fn expects_response(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("expects_response", &self.expects_response())
            .finish()
    }
}

/// What a `runtime.onMessage` listener receives.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message: Value,
    pub sender: MessageSender,
    pub responder: Responder,
}

impl MessageEvent {
    /// Shorthand for `self.responder.respond(value)`.
    pub fn respond(&self, value: Value) -> bool {
        self.responder.respond(value)
    }
}

/// Response synthesized when no listener answers.
pub fn fallback_response(message: Value) -> Value {
    json!({ "ok": true, "echo": message })
}

pub struct Runtime {
    id: String,
    origin: String,
    href: String,
    on_message: EventChannel<MessageEvent>,
    diagnostics: Diagnostics,
}

impl Runtime {
    pub fn new(
        config: &RuntimeConfig,
        location: Option<&Location>,
        diagnostics: Diagnostics,
    ) -> Self {
        let (origin, href) = match location {
            Some(location) => (location.origin.clone(), location.href.clone()),
            None => (config.default_origin.clone(), String::new()),
        };

        Self {
            id: config.extension_id.clone(),
            origin,
            href,
            on_message: EventChannel::new("runtime.onMessage"),
            diagnostics,
        }
    }

    /// Extension id reported to listeners.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn on_message(&self) -> &EventChannel<MessageEvent> {
        &self.on_message
    }

    /// Send `message` to every listener and return the single response.
    pub fn send_message(&self, message: Value) -> Value {
        self.diagnostics.record("runtime.sendMessage", &message);

        let token = Arc::new(ResponseToken::new());
        let event = MessageEvent {
            message,
            sender: self.sender(),
            responder: Responder::new(Arc::clone(&token)),
        };
        self.on_message.emit(&event);

        match token.finish() {
            Some(response) => response,
            None => fallback_response(event.message),
        }
    }

    /// Send `message` without waiting for a response.
    pub fn post_message(&self, message: Value) {
        self.diagnostics.record("runtime.sendMessage", &message);

        let event = MessageEvent {
            message,
            sender: self.sender(),
            responder: Responder::detached(),
        };
        self.on_message.emit(&event);
    }

    /// Resolve `path` against the extension origin.
    pub fn get_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin, path)
    }

    fn sender(&self) -> MessageSender {
        MessageSender {
            id: self.id.clone(),
            url: self.href.clone(),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("on_message", &self.on_message)
            .finish()
    }
}
