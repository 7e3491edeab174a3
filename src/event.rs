//! Generic event channel shared by every event-bearing namespace.
//!
//! An [`EventChannel`] keeps an ordered list of listeners and notifies them
//! synchronously. Emission works on a snapshot taken when `emit` starts, so
//! listeners added or removed while an emission is running only affect later
//! emissions. A listener that panics is logged and skipped; the remaining
//! listeners still run and the panic never reaches the emitter.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostics::TARGET;

/// A registered handler. Identity is the identity of the `Arc`.
pub type Listener<A> = Arc<dyn Fn(&A) + Send + Sync + 'static>;

/// Wrap a closure as a [`Listener`].
pub fn listener<A, F>(f: F) -> Listener<A>
where
    F: Fn(&A) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct EventChannel<A> {
    name: &'static str,
    listeners: Mutex<Vec<Listener<A>>>,
}

impl<A> EventChannel<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a listener. The same listener may be registered more than once.
    pub fn subscribe(&self, listener: Listener<A>) {
        self.listeners.lock().push(listener);
    }

    /// Remove the first registration of `listener`. Unknown listeners are ignored.
    pub fn unsubscribe(&self, listener: &Listener<A>) {
        let mut listeners = self.listeners.lock();
        if let Some(index) = listeners.iter().position(|l| same_listener(l, listener)) {
            listeners.remove(index);
        }
    }

    pub fn has_subscribers(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Notify every listener registered when this call starts, in registration order.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn emit(&self, args: &A) -> usize {
        // The lock is released before any listener runs so listeners may
        // subscribe or unsubscribe on this channel.
        let snapshot: Vec<Listener<A>> = self.listeners.lock().clone();

        let mut delivered = 0;
        for handler in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    tracing::error!(
                        target: TARGET,
                        event = self.name,
                        "listener panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }
}

impl<A> fmt::Debug for EventChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn same_listener<A>(a: &Listener<A>, b: &Listener<A>) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
