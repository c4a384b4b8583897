//! Provider notifications and RAII listener handles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;
use shared::chains::{parse_chain_id, to_hex_chain_id};
use shared::dto::rpc::{accounts_from_value, events};

/// Notification from the authoritative provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    /// Normalized lowercase hex chain id.
    ChainChanged(String),
    Disconnected,
}

impl ProviderEvent {
    /// Decode a raw `provider.on(event, payload)` notification.
    pub fn from_notification(event: &str, payload: &Value) -> Option<Self> {
        match event {
            events::ACCOUNTS_CHANGED => Some(ProviderEvent::AccountsChanged(accounts_from_value(payload))),
            events::CHAIN_CHANGED => normalize_chain_payload(payload).map(ProviderEvent::ChainChanged),
            events::DISCONNECT => Some(ProviderEvent::Disconnected),
            _ => None,
        }
    }
}

/// Chain ids arrive as hex strings, decimal strings, numbers or CAIP-2
/// (`eip155:137`) depending on the wallet.
pub fn normalize_chain_payload(payload: &Value) -> Option<String> {
    match payload {
        Value::Number(n) => n.as_u64().map(to_hex_chain_id),
        Value::String(s) => {
            let raw = s.strip_prefix("eip155:").unwrap_or(s);
            parse_chain_id(raw)
                .or_else(|| raw.parse::<u64>().ok())
                .map(to_hex_chain_id)
        }
        _ => None,
    }
}

pub type EventHandler = Rc<dyn Fn(ProviderEvent)>;

/// Listener registration; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for a listener that needs no cleanup.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: Vec<(u64, EventHandler)>,
}

/// Fan-out of provider events to any number of subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: EventHandler) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.handlers.push((id, handler));
            id
        };
        let weak: Weak<RefCell<BusInner>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Deliver to a snapshot of the current handlers, so handlers may
    /// subscribe or unsubscribe while being called.
    pub fn emit(&self, event: ProviderEvent) {
        let handlers: Vec<EventHandler> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
