//! # Persistence Facade
//!
//! Typed access to the handful of keys the widget keeps in browser storage so
//! a connection survives a page reload. The backing store is a plain
//! string key-value map ([`KeyValueStore`]); this module owns the key names
//! and the boolean encoding (`"true"` when set, key absent otherwise).
//!
//! Keys are process-wide and unscoped: two tabs share them without locking.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::Result;

/// Minimal string key-value store (browser `localStorage` shape).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Every key currently present.
    fn keys(&self) -> Vec<String>;
}

/// In-memory store. Used by tests and when `localStorage` is unavailable
/// (private browsing, storage disabled).
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

/// Boolean flags persisted across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistedFlag {
    /// The user explicitly approved a connection.
    ConnectionActive,
    /// The user explicitly disconnected; suppresses auto-reconnect.
    ManuallyDisconnected,
}

impl PersistedFlag {
    pub fn key(self) -> &'static str {
        match self {
            PersistedFlag::ConnectionActive => "walletConnectionActive",
            PersistedFlag::ManuallyDisconnected => "walletManuallyDisconnected",
        }
    }
}

/// Provider id of the last approved connection.
pub const ACTIVE_PROVIDER_KEY: &str = "walletActiveProvider";

/// Prefixes of keys owned by the WalletConnect SDK and its modal.
pub const PAIRING_KEY_PREFIXES: &[&str] = &[
    "wc@2:",
    "walletconnect",
    "WALLETCONNECT_DEEPLINK_CHOICE",
    "W3M",
    "@w3m",
];

/// Typed facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct WalletPersistence {
    store: Rc<dyn KeyValueStore>,
}

impl WalletPersistence {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Facade over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()))
    }

    pub fn flag(&self, flag: PersistedFlag) -> bool {
        self.store.get(flag.key()).as_deref() == Some("true")
    }

    /// Setting `false` removes the key.
    pub fn set_flag(&self, flag: PersistedFlag, value: bool) -> Result<()> {
        if value {
            self.store.set(flag.key(), "true")
        } else {
            self.store.remove(flag.key())
        }
    }

    pub fn active_provider(&self) -> Option<String> {
        self.store.get(ACTIVE_PROVIDER_KEY)
    }

    pub fn set_active_provider(&self, provider_id: Option<&str>) -> Result<()> {
        match provider_id {
            Some(id) => self.store.set(ACTIVE_PROVIDER_KEY, id),
            None => self.store.remove(ACTIVE_PROVIDER_KEY),
        }
    }

    /// A previous connection was approved and not explicitly ended.
    pub fn can_restore(&self) -> bool {
        self.flag(PersistedFlag::ConnectionActive) && !self.flag(PersistedFlag::ManuallyDisconnected)
    }

    /// Record an approved connection.
    pub fn mark_connected(&self, provider_id: &str) -> Result<()> {
        self.set_flag(PersistedFlag::ConnectionActive, true)?;
        self.set_flag(PersistedFlag::ManuallyDisconnected, false)?;
        self.set_active_provider(Some(provider_id))
    }

    /// Record an explicit user disconnect.
    pub fn mark_manually_disconnected(&self) -> Result<()> {
        self.set_flag(PersistedFlag::ManuallyDisconnected, true)?;
        self.clear_connection()
    }

    /// Forget the approved connection without touching the manual flag.
    pub fn clear_connection(&self) -> Result<()> {
        self.set_flag(PersistedFlag::ConnectionActive, false)?;
        self.set_active_provider(None)
    }

    /// Remove every key owned by the pairing SDK. Returns how many were removed.
    pub fn clear_pairing_keys(&self) -> Result<usize> {
        let doomed: Vec<String> = self
            .store
            .keys()
            .into_iter()
            .filter(|key| PAIRING_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
            .collect();
        for key in &doomed {
            self.store.remove(key)?;
        }
        if !doomed.is_empty() {
            tracing::debug!(removed = doomed.len(), "cleared pairing storage keys");
        }
        Ok(doomed.len())
    }
}
