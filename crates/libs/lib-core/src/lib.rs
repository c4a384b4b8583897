//! # Core Library
//!
//! Configuration, the wallet error taxonomy, and the typed persistence facade
//! used by the connection controller.

pub mod config;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::{core_config, init_config, Config};
pub use error::{Result, WalletError};
pub use store::{KeyValueStore, MemoryStore, PersistedFlag, WalletPersistence};
