//! # Wallet Connection Core
//!
//! Target-independent wallet-connection state management. Browser specifics
//! (the injected `window.ethereum` object, the WalletConnect SDK, timers,
//! navigation) sit behind the traits in [`provider`]; the web crate supplies
//! the real implementations and the tests supply scripted doubles.
//!
//! ## Layers
//!
//! - [`registry`]: supported wallet kinds and how each is detected
//! - [`adapter`]: one capability-set adapter per vendor family
//! - [`session`]: the WalletConnect pairing session lifecycle
//! - [`controller`]: the connection state machine the UI renders from
//!
//! Everything runs on a single-threaded event loop: futures are `!Send`,
//! shared state lives in `Rc<RefCell<_>>`, and no borrow is ever held across
//! an `.await`.

pub mod adapter;
pub mod controller;
pub mod events;
pub mod provider;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{Connection, WalletAdapter};
pub use controller::{ConnectOutcome, ConnectionController, ConnectionPhase, ConnectionState, MenuState, MenuTab};
pub use events::{EventBus, EventHandler, ProviderEvent, Subscription};
pub use provider::{BrowserEnv, Eip1193, PairingClient, PairingClientFactory, PairingHandles, PairingModal, PairingOptions, Timer};
pub use registry::{ProviderRegistry, WalletDescriptor, WalletKind};
pub use session::{SessionManager, SessionStatus};
