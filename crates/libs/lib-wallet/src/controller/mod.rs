//! # Connection State Controller
//!
//! The single source of truth the widget renders from. It drives the
//! connect / disconnect / switch flows through a [`ProviderRegistry`],
//! reacts to provider notifications, and persists just enough to restore a
//! connection after a reload.
//!
//! ## State Machine
//!
//! ```text
//!                 connect(p)                     success
//! Disconnected ─────────────▶ Connecting ─────────────────▶ Connected
//!      ▲                          │ failure / not installed     │
//!      │◀─────────────────────────┘                             │
//!      │                 disconnect() / remote disconnect       │
//!      └◀──────────────── Disconnecting ◀───────────────────────┘
//! ```
//!
//! Switching to another provider while connected tears the old one down
//! (listeners, state, remote session), waits a short grace delay for the
//! extension to settle, then connects the new one.
//!
//! ## Persistence
//!
//! | Key | Set | Cleared |
//! |-----|-----|---------|
//! | `walletConnectionActive` | successful connect | disconnect, failed connect or restore, remote disconnect |
//! | `walletManuallyDisconnected` | explicit disconnect | successful connect |
//!
//! [`ConnectionController::restore`] only re-attaches when the first is set
//! and the second is not.

mod state;


pub use state::{ConnectionPhase, ConnectionState, MenuState, MenuTab};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use lib_core::{Config, Result, WalletError, WalletPersistence};

use crate::adapter::{Connection, WalletAdapter};
use crate::events::{ProviderEvent, Subscription};
use crate::provider::{BrowserEnv, Timer};
use crate::registry::{ProviderRegistry, WalletKind};

/// How a [`ConnectionController::connect`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// Another connect or a disconnect was already running; nothing happened.
    AlreadyPending,
    /// The wallet is not installed; its install page was opened.
    InstallRedirected,
    /// A disconnect overtook this attempt; its result was discarded.
    Cancelled,
    Failed(WalletError),
}

type Observer = Rc<dyn Fn(&ConnectionState)>;

pub struct ConnectionController {
    registry: ProviderRegistry,
    persistence: WalletPersistence,
    browser: Rc<dyn BrowserEnv>,
    timer: Rc<dyn Timer>,
    switch_grace_ms: u32,
    state: RefCell<ConnectionState>,
    /// Listeners on the authoritative provider.
    subscriptions: RefCell<Vec<Subscription>>,
    observers: RefCell<Vec<Observer>>,
    /// Bumped by every disconnect so in-flight attempts can tell they lost.
    epoch: Cell<u64>,
    this: Weak<ConnectionController>,
}

impl ConnectionController {
    pub fn new(
        registry: ProviderRegistry,
        persistence: WalletPersistence,
        browser: Rc<dyn BrowserEnv>,
        timer: Rc<dyn Timer>,
        config: &Config,
    ) -> Rc<Self> {
        let switch_grace_ms = config.switch_grace_ms;
        Rc::new_cyclic(|this| Self {
            registry,
            persistence,
            browser,
            timer,
            switch_grace_ms,
            state: RefCell::new(ConnectionState::default()),
            subscriptions: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
            this: this.clone(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Call `observer` after every state change.
    pub fn watch(&self, observer: impl Fn(&ConnectionState) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn update(&self, apply: impl FnOnce(&mut ConnectionState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            apply(&mut state);
            debug_assert!(state.is_consistent(), "inconsistent connection state: {state:?}");
            state.clone()
        };
        let observers: Vec<Observer> = self.observers.borrow().clone();
        for observer in observers {
            observer(&snapshot);
        }
    }

    fn connected_provider(&self) -> Result<WalletKind> {
        let state = self.state.borrow();
        match (state.active_provider, &state.active_account) {
            (Some(kind), Some(_)) => Ok(kind),
            _ => Err(WalletError::ProviderUnavailable("No wallet connected".to_string())),
        }
    }

    fn persist(&self, what: &str, result: Result<()>) {
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist {what}");
        }
    }

    // ------------------------------------------------------------------
    // Menu
    // ------------------------------------------------------------------

    pub fn toggle_menu(&self) {
        self.update(|s| s.menu.open = !s.menu.open);
    }

    pub fn close_menu(&self) {
        if self.state.borrow().menu.open {
            self.update(|s| s.menu.open = false);
        }
    }

    pub fn select_tab(&self, tab: MenuTab) {
        self.update(|s| s.menu.tab = tab);
    }

    // ------------------------------------------------------------------
    // Connect
    // ------------------------------------------------------------------

    pub async fn connect(&self, kind: WalletKind) -> ConnectOutcome {
        {
            let state = self.state.borrow();
            if state.loading || state.disconnecting {
                tracing::debug!(provider = %kind, "connect ignored, another operation is pending");
                return ConnectOutcome::AlreadyPending;
            }
        }

        let adapter = self.registry.adapter(kind);
        if !adapter.detect_installed() {
            let url = kind.descriptor().install_url;
            tracing::info!(provider = %kind, url, "wallet not installed, opening install page");
            self.browser.open_in_new_tab(url);
            return ConnectOutcome::InstallRedirected;
        }

        let epoch = self.epoch.get();
        self.update(|s| {
            s.loading = true;
            s.pending_provider = Some(kind);
            s.menu.open = false;
        });

        let previous = self.state.borrow().active_provider;
        if let Some(previous) = previous {
            self.teardown(previous).await;
            self.timer.sleep(self.switch_grace_ms).await;
        }

        let result = adapter.request_connection().await;
        if self.epoch.get() != epoch {
            tracing::info!(provider = %kind, "connect superseded by disconnect");
            return ConnectOutcome::Cancelled;
        }

        match result {
            Ok(connection) if !connection.accounts.is_empty() => {
                self.install(kind, connection, &*adapter);
                self.persist("connection", self.persistence.mark_connected(kind.id()));
                ConnectOutcome::Connected
            }
            Ok(_) => self.fail(kind, WalletError::provider("Wallet returned no accounts")),
            Err(err) => self.fail(kind, err),
        }
    }

    fn fail(&self, kind: WalletKind, err: WalletError) -> ConnectOutcome {
        if err.is_user_rejected() {
            tracing::info!(provider = %kind, "user rejected the connection");
        } else {
            tracing::error!(provider = %kind, error = %err, "wallet connection failed");
        }
        self.drop_subscriptions();
        self.update(|s| {
            s.clear_connection();
            s.finish_attempt();
        });
        self.persist("connection", self.persistence.clear_connection());
        ConnectOutcome::Failed(err)
    }

    /// Adopt `connection` as the authoritative one and listen to its provider.
    fn install(&self, kind: WalletKind, connection: Connection, adapter: &dyn WalletAdapter) {
        self.drop_subscriptions();
        let controller = self.this.clone();
        let subscriptions = adapter.subscribe(Rc::new(move |event| {
            if let Some(controller) = controller.upgrade() {
                controller.handle_event(kind, event);
            }
        }));
        *self.subscriptions.borrow_mut() = subscriptions;

        tracing::info!(
            provider = %kind,
            accounts = connection.accounts.len(),
            chain_id = connection.chain_id.as_deref().unwrap_or("unknown"),
            "wallet connected"
        );
        self.update(|s| {
            s.apply_connection(kind, connection);
            s.finish_attempt();
        });
    }

    /// Release the previous provider before another one takes over.
    async fn teardown(&self, kind: WalletKind) {
        tracing::info!(provider = %kind, "tearing down previous provider");
        self.drop_subscriptions();
        self.update(|s| s.clear_connection());
        if let Err(err) = self.registry.adapter(kind).disconnect().await {
            tracing::warn!(provider = %kind, error = %err, "previous provider did not disconnect cleanly");
        }
    }

    fn drop_subscriptions(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);
    }

    // ------------------------------------------------------------------
    // Disconnect
    // ------------------------------------------------------------------

    /// Explicit user disconnect. Suppresses auto-restore until the next
    /// successful connect.
    pub async fn disconnect(&self) {
        if self.state.borrow().disconnecting {
            return;
        }
        // A first connect has no active provider yet; its pending pairing
        // must be torn down as well.
        let kind = {
            let state = self.state.borrow();
            state.active_provider.or(state.pending_provider)
        };
        self.epoch.set(self.epoch.get() + 1);

        self.update(|s| {
            s.disconnecting = true;
            s.menu.open = false;
        });
        self.persist("manual disconnect", self.persistence.mark_manually_disconnected());
        self.drop_subscriptions();
        self.update(|s| {
            s.clear_connection();
            s.finish_attempt();
        });

        if let Some(kind) = kind {
            if let Err(err) = self.registry.adapter(kind).disconnect().await {
                tracing::warn!(provider = %kind, error = %err, "provider disconnect failed");
            }
        }
        if let Err(err) = self.persistence.clear_pairing_keys() {
            tracing::warn!(error = %err, "failed to clear pairing storage");
        }

        self.update(|s| s.disconnecting = false);
        tracing::info!("wallet disconnected");
    }

    /// The wallet ended the connection (locked, revoked, session expired).
    /// The manual-disconnect flag is left alone.
    fn handle_remote_disconnect(&self, kind: WalletKind) {
        tracing::info!(provider = %kind, "wallet disconnected remotely");
        self.drop_subscriptions();
        self.update(|s| s.clear_connection());
        self.persist("connection", self.persistence.clear_connection());
    }

    // ------------------------------------------------------------------
    // Switching
    // ------------------------------------------------------------------

    /// Ask the connected wallet to move to `chain_id` (hex).
    ///
    /// WalletConnect switches are shown optimistically and rolled back with
    /// an alert on failure; injected wallets update only once they confirm.
    pub async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        let kind = self.connected_provider()?;
        let target = chain_id.to_ascii_lowercase();
        let previous = self.state.borrow().active_chain_id.clone();
        let optimistic = kind.is_remote();

        self.update(|s| {
            s.menu.open = false;
            if optimistic {
                s.active_chain_id = Some(target.clone());
            }
        });

        match self.registry.adapter(kind).switch_chain(&target).await {
            Ok(()) => {
                tracing::info!(provider = %kind, chain_id = %target, "chain switched");
                if self.state.borrow().active_provider == Some(kind) {
                    self.update(|s| s.active_chain_id = Some(target));
                }
                Ok(())
            }
            Err(err) => {
                if err.is_user_rejected() {
                    tracing::info!(provider = %kind, chain_id = %target, "user rejected chain switch");
                } else {
                    tracing::error!(provider = %kind, chain_id = %target, error = %err, "chain switch failed");
                }
                if optimistic {
                    if self.state.borrow().active_provider == Some(kind) {
                        self.update(|s| s.active_chain_id = previous);
                    }
                    self.browser.alert(&switch_failure_message(&err));
                }
                Err(err)
            }
        }
    }

    /// Make `address` the active account.
    ///
    /// Injected wallets re-prompt for account permissions and report the
    /// user's new selection; WalletConnect sessions can only pick among the
    /// accounts they already share.
    pub async fn switch_account(&self, address: &str) -> Result<()> {
        let kind = self.connected_provider()?;
        self.close_menu();

        match self.registry.adapter(kind).refresh_accounts().await? {
            Some(accounts) if accounts.is_empty() => {
                self.handle_remote_disconnect(kind);
                Err(WalletError::ProviderUnavailable("Wallet returned no accounts".to_string()))
            }
            Some(accounts) => {
                let wanted = accounts.iter().find(|a| a.eq_ignore_ascii_case(address)).cloned();
                self.update(|s| {
                    s.apply_accounts(accounts);
                    if let Some(wanted) = wanted {
                        s.active_account = Some(wanted);
                    }
                });
                tracing::info!(provider = %kind, "accounts refreshed");
                Ok(())
            }
            None => {
                let known = self
                    .state
                    .borrow()
                    .known_accounts
                    .iter()
                    .find(|a| a.eq_ignore_ascii_case(address))
                    .cloned();
                let Some(account) = known else {
                    return Err(WalletError::provider(format!(
                        "{address} is not shared by the connected wallet"
                    )));
                };
                self.update(|s| s.active_account = Some(account));
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Restore & events
    // ------------------------------------------------------------------

    /// Silently re-attach to the last approved provider. Returns whether a
    /// connection was restored.
    pub async fn restore(&self) -> bool {
        if !self.persistence.can_restore() {
            tracing::debug!("no connection to restore");
            return false;
        }
        if self.state.borrow().loading {
            return false;
        }
        let Some(kind) = self.persistence.active_provider().and_then(|id| WalletKind::from_id(&id)) else {
            tracing::debug!("persisted provider unknown, forgetting connection");
            self.persist("connection", self.persistence.clear_connection());
            return false;
        };

        let epoch = self.epoch.get();
        let adapter = self.registry.adapter(kind);
        self.update(|s| {
            s.loading = true;
            s.pending_provider = Some(kind);
        });

        let restored = adapter.restore_connection().await;
        if self.epoch.get() != epoch {
            return false;
        }
        match restored {
            Ok(Some(connection)) if !connection.accounts.is_empty() => {
                self.install(kind, connection, &*adapter);
                true
            }
            Ok(_) => {
                tracing::info!(provider = %kind, "wallet no longer authorizes this site");
                self.update(ConnectionState::finish_attempt);
                self.persist("connection", self.persistence.clear_connection());
                false
            }
            Err(err) => {
                tracing::warn!(provider = %kind, error = %err, "connection restore failed");
                self.update(ConnectionState::finish_attempt);
                self.persist("connection", self.persistence.clear_connection());
                false
            }
        }
    }

    fn handle_event(&self, kind: WalletKind, event: ProviderEvent) {
        if self.state.borrow().active_provider != Some(kind) {
            tracing::debug!(provider = %kind, ?event, "event from inactive provider ignored");
            return;
        }
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                self.handle_remote_disconnect(kind);
            }
            ProviderEvent::AccountsChanged(accounts) => {
                tracing::debug!(provider = %kind, accounts = accounts.len(), "accounts changed");
                self.update(|s| s.apply_accounts(accounts));
            }
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::debug!(provider = %kind, %chain_id, "chain changed");
                self.update(|s| s.active_chain_id = Some(chain_id));
            }
            ProviderEvent::Disconnected => self.handle_remote_disconnect(kind),
        }
    }
}

fn switch_failure_message(err: &WalletError) -> String {
    match err {
        WalletError::UnsupportedChain(_) => "This network is not supported by the connected wallet.".to_string(),
        WalletError::UserRejected(_) => "Network switch was rejected in the wallet.".to_string(),
        _ => "Could not switch network. Please try again from your wallet.".to_string(),
    }
}
