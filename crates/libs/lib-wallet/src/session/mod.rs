//! # WalletConnect Session Manager
//!
//! Owns the single remote-pairing client of the page.
//!
//! ```text
//! Uninitialized ──init()──▶ Initializing ──▶ Ready ──connect()──▶ Connecting ──▶ Connected
//!        ▲                        │                                   │
//!        └──── reset() ◀──────── Error ◀──────────────────────────────┘
//! ```
//!
//! - `init()` is idempotent: concurrent callers share one in-flight creation.
//! - `connect()` waits for accounts from whichever arrives first: the SDK's
//!   `connect()` resolving, a `connect`/`accountsChanged` event, or the
//!   timeout. Accounts present at the deadline still count as success.
//! - `reset()` drops the client; a creation still in flight when `reset()`
//!   runs is discarded instead of installed.
//! - Client events are rebroadcast to [`SessionManager::subscribe`]rs, so
//!   subscriptions survive a client being replaced.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::channel::mpsc;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use futures::StreamExt;
use lib_core::{Config, Result, WalletError};
use serde_json::Value;
use shared::chains::to_hex_chain_id;
use shared::dto::rpc::{accounts_from_value, events, methods, switch_chain_params};

use crate::events::{EventBus, EventHandler, ProviderEvent, Subscription};
use crate::provider::{PairingClientFactory, PairingHandles, PairingOptions, Timer};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Connecting,
    Connected,
    Error,
}

type InitFuture = Shared<LocalBoxFuture<'static, Result<PairingHandles>>>;

struct ActiveSession {
    handles: PairingHandles,
    _relay: Vec<Subscription>,
}

#[derive(Default)]
struct SessionInner {
    status: SessionStatus,
    session: Option<ActiveSession>,
    /// Creation in progress, tagged with its sequence number.
    in_flight: Option<(u64, InitFuture)>,
    init_seq: u64,
    /// Bumped by every reset; an init started under an older generation is stale.
    generation: u64,
}

/// What the connect wait loop hears from the client and modal.
enum PairingSignal {
    Connected,
    Accounts(Vec<String>),
    Disconnected,
    ModalClosed,
}

pub struct SessionManager {
    factory: Rc<dyn PairingClientFactory>,
    timer: Rc<dyn Timer>,
    options: PairingOptions,
    connect_timeout_ms: u32,
    inner: RefCell<SessionInner>,
    bus: EventBus,
    this: Weak<SessionManager>,
}

impl SessionManager {
    pub fn new(factory: Rc<dyn PairingClientFactory>, timer: Rc<dyn Timer>, config: &Config) -> Rc<Self> {
        let options = PairingOptions::from_config(config);
        let connect_timeout_ms = config.connect_timeout_ms;
        Rc::new_cyclic(|this| Self {
            factory,
            timer,
            options,
            connect_timeout_ms,
            inner: RefCell::new(SessionInner::default()),
            bus: EventBus::new(),
            this: this.clone(),
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.borrow().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == SessionStatus::Connected
    }

    /// Handles of the installed client, if any.
    pub fn current(&self) -> Option<PairingHandles> {
        self.inner.borrow().session.as_ref().map(|active| active.handles.clone())
    }

    pub fn accounts(&self) -> Vec<String> {
        self.current()
            .map(|handles| handles.client.accounts())
            .unwrap_or_default()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.current().and_then(|handles| handles.client.chain_id())
    }

    /// Receive every event of the current and any future client.
    pub fn subscribe(&self, handler: EventHandler) -> Subscription {
        self.bus.subscribe(handler)
    }

    fn set_status(&self, status: SessionStatus) {
        let mut inner = self.inner.borrow_mut();
        if inner.status != status {
            tracing::debug!(from = ?inner.status, to = ?status, "pairing session status");
            inner.status = status;
        }
    }

    fn is_current(&self, handles: &PairingHandles) -> bool {
        self.inner
            .borrow()
            .session
            .as_ref()
            .is_some_and(|active| Rc::ptr_eq(&active.handles.client, &handles.client))
    }

    /// Create the pairing client, or return the existing one.
    pub async fn init(&self) -> Result<PairingHandles> {
        let (generation, init_id, pending) = {
            let mut inner = self.inner.borrow_mut();
            if let Some(active) = &inner.session {
                return Ok(active.handles.clone());
            }
            let (init_id, pending) = match &inner.in_flight {
                Some((init_id, pending)) => (*init_id, pending.clone()),
                None => {
                    let factory = self.factory.clone();
                    let options = self.options.clone();
                    let pending = async move { factory.create(&options).await }
                        .boxed_local()
                        .shared();
                    inner.init_seq += 1;
                    let init_id = inner.init_seq;
                    inner.in_flight = Some((init_id, pending.clone()));
                    inner.status = SessionStatus::Initializing;
                    tracing::debug!(project_id = %self.options.project_id, "initializing pairing client");
                    (init_id, pending)
                }
            };
            (inner.generation, init_id, pending)
        };

        let result = pending.await;
        self.settle_init(generation, init_id, result)
    }

    fn settle_init(&self, generation: u64, init_id: u64, result: Result<PairingHandles>) -> Result<PairingHandles> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != generation {
                return Err(WalletError::provider("Pairing session was reset during initialization"));
            }
            // Another awaiter of the same creation got here first.
            if let Some(active) = &inner.session {
                return Ok(active.handles.clone());
            }
            if inner.in_flight.as_ref().is_some_and(|(id, _)| *id == init_id) {
                inner.in_flight = None;
            }
            if let Err(err) = &result {
                tracing::error!(error = %err, "pairing client initialization failed");
                inner.status = SessionStatus::Error;
            }
        }

        let handles = result?;
        let relay = self.relay(&handles);
        let mut inner = self.inner.borrow_mut();
        inner.session = Some(ActiveSession {
            handles: handles.clone(),
            _relay: relay,
        });
        inner.status = if handles.client.accounts().is_empty() {
            SessionStatus::Ready
        } else {
            SessionStatus::Connected
        };
        tracing::info!(status = ?inner.status, "pairing client ready");
        Ok(handles)
    }

    /// Forward client notifications to subscribers. A remote `disconnect`
    /// also ends the local session.
    fn relay(&self, handles: &PairingHandles) -> Vec<Subscription> {
        [events::ACCOUNTS_CHANGED, events::CHAIN_CHANGED, events::DISCONNECT]
            .into_iter()
            .map(|event| {
                let bus = self.bus.clone();
                let manager = self.this.clone();
                handles.client.on(
                    event,
                    Rc::new(move |payload: Value| {
                        let Some(decoded) = ProviderEvent::from_notification(event, &payload) else {
                            return;
                        };
                        if decoded == ProviderEvent::Disconnected {
                            if let Some(manager) = manager.upgrade() {
                                tracing::info!("pairing session ended by the wallet");
                                manager.reset();
                            }
                        }
                        bus.emit(decoded);
                    }),
                )
            })
            .collect()
    }

    /// Open the pairing flow and wait for accounts.
    pub async fn connect(&self) -> Result<Vec<String>> {
        let handles = self.init().await?;
        if self.is_connected() {
            let accounts = handles.client.accounts();
            if !accounts.is_empty() {
                return Ok(accounts);
            }
        }

        self.set_status(SessionStatus::Connecting);
        let outcome = self.await_accounts(&handles).await;

        match outcome {
            Ok(accounts) if self.is_current(&handles) => {
                tracing::info!(accounts = accounts.len(), "pairing session connected");
                self.set_status(SessionStatus::Connected);
                Ok(accounts)
            }
            Ok(_) => Err(WalletError::provider("Pairing session was reset while connecting")),
            Err(err) if self.is_current(&handles) => {
                tracing::warn!(error = %err, "pairing connect failed");
                self.reset();
                self.set_status(SessionStatus::Error);
                Err(err)
            }
            Err(err) => {
                tracing::debug!(error = %err, "pairing connect ended after reset");
                Err(err)
            }
        }
    }

    async fn await_accounts(&self, handles: &PairingHandles) -> Result<Vec<String>> {
        let (tx, mut rx) = mpsc::unbounded::<PairingSignal>();
        let mut guards = Vec::new();

        for event in [events::CONNECT, events::ACCOUNTS_CHANGED, events::DISCONNECT] {
            let tx = tx.clone();
            guards.push(handles.client.on(
                event,
                Rc::new(move |payload: Value| {
                    let signal = match event {
                        events::ACCOUNTS_CHANGED => PairingSignal::Accounts(accounts_from_value(&payload)),
                        events::DISCONNECT => PairingSignal::Disconnected,
                        _ => PairingSignal::Connected,
                    };
                    let _ = tx.unbounded_send(signal);
                }),
            ));
        }
        if let Some(modal) = &handles.modal {
            let tx = tx.clone();
            guards.push(modal.subscribe_modal(Rc::new(move |open| {
                if !open {
                    let _ = tx.unbounded_send(PairingSignal::ModalClosed);
                }
            })));
        }
        drop(tx);

        let mut connect_call = handles.client.connect().fuse();
        let mut deadline = self.timer.sleep(self.connect_timeout_ms).fuse();

        loop {
            futures::select! {
                result = connect_call => {
                    result?;
                    let accounts = handles.client.accounts();
                    if !accounts.is_empty() {
                        return Ok(accounts);
                    }
                },
                signal = rx.next() => match signal {
                    Some(PairingSignal::Accounts(accounts)) if !accounts.is_empty() => return Ok(accounts),
                    Some(PairingSignal::Connected) => {
                        let accounts = handles.client.accounts();
                        if !accounts.is_empty() {
                            return Ok(accounts);
                        }
                    }
                    Some(PairingSignal::Disconnected) => {
                        return Err(WalletError::UserRejected("Wallet ended the pairing session".to_string()));
                    }
                    Some(PairingSignal::ModalClosed) => {
                        let accounts = handles.client.accounts();
                        return if accounts.is_empty() {
                            Err(WalletError::UserRejected("Pairing modal closed".to_string()))
                        } else {
                            Ok(accounts)
                        };
                    }
                    Some(PairingSignal::Accounts(_)) | None => {}
                },
                () = deadline => {
                    let accounts = handles.client.accounts();
                    return if accounts.is_empty() {
                        Err(WalletError::ConnectionTimeout(self.connect_timeout_ms))
                    } else {
                        tracing::debug!("accounts arrived without a connect notification");
                        Ok(accounts)
                    };
                },
            }
        }
    }

    /// Re-attach to a session the SDK rehydrated from storage.
    pub async fn restore(&self) -> Result<Option<Vec<String>>> {
        let handles = self.init().await?;
        let accounts = handles.client.accounts();
        if accounts.is_empty() {
            return Ok(None);
        }
        if self.is_current(&handles) {
            self.set_status(SessionStatus::Connected);
        }
        Ok(Some(accounts))
    }

    pub async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        if !self.options.supports_chain(chain_id) {
            return Err(WalletError::UnsupportedChain(to_hex_chain_id(chain_id)));
        }
        let handles = self
            .current()
            .filter(|_| self.is_connected())
            .ok_or_else(|| WalletError::ProviderUnavailable("No active pairing session".to_string()))?;

        handles
            .client
            .request(
                methods::WALLET_SWITCH_ETHEREUM_CHAIN,
                Some(switch_chain_params(&to_hex_chain_id(chain_id))),
            )
            .await?;
        tracing::info!(chain_id, "pairing session switched chain");
        Ok(())
    }

    /// End the session remotely and locally. Local state is cleared even
    /// when the remote call fails.
    pub async fn disconnect(&self) {
        if let Some(handles) = self.current() {
            if let Some(modal) = &handles.modal {
                modal.close_modal();
            }
            if let Err(err) = handles.client.disconnect().await {
                tracing::warn!(error = %err, "remote pairing disconnect failed, clearing local session");
            }
        }
        self.reset();
    }

    /// Drop the client so the next `init()` builds a fresh one.
    pub fn reset(&self) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.in_flight = None;
            inner.status = SessionStatus::Uninitialized;
            inner.session.take()
        };
        if let Some(active) = previous {
            if let Some(modal) = &active.handles.modal {
                modal.close_modal();
            }
            tracing::debug!("pairing client dropped");
        }
    }
}
