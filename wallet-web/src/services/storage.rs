//! `localStorage`-backed key-value store

use std::rc::Rc;

use lib_core::{KeyValueStore, MemoryStore, Result, WalletError, WalletPersistence};

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// `None` when storage is disabled (private browsing, sandboxed iframes).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| WalletError::Storage(format!("set {}: {:?}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| WalletError::Storage(format!("remove {}: {:?}", key, e)))
    }

    fn keys(&self) -> Vec<String> {
        let len = self.storage.length().unwrap_or(0);
        (0..len)
            .filter_map(|i| self.storage.key(i).ok().flatten())
            .collect()
    }
}

/// Persistence over `localStorage`, or memory if it is unavailable.
pub fn browser_persistence() -> WalletPersistence {
    match LocalStorage::open() {
        Some(storage) => WalletPersistence::new(Rc::new(storage)),
        None => {
            log::warn!("localStorage unavailable, wallet connection will not survive reloads");
            WalletPersistence::new(Rc::new(MemoryStore::new()))
        }
    }
}
