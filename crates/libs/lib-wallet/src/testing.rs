//! Scripted doubles for the browser seams.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use lib_core::{Config, Result, WalletError, WalletPersistence};
use serde_json::{json, Value};
use shared::chains::to_hex_chain_id;
use shared::dto::rpc::{events, methods};

use crate::controller::ConnectionController;
use crate::events::Subscription;
use crate::provider::{
    BrowserEnv, Eip1193, PairingClient, PairingClientFactory, PairingHandles, PairingModal,
    PairingOptions, Timer,
};
use crate::registry::{InjectedDetection, ProviderRegistry};
use crate::session::SessionManager;

pub(crate) type Listener = (u64, String, Rc<dyn Fn(Value)>);

/// Listener list shared by the mocks. Emits to a snapshot so handlers may
/// unsubscribe while running.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    entries: Rc<RefCell<Vec<Listener>>>,
}

impl Listeners {
    fn add(&self, event: &str, handler: Rc<dyn Fn(Value)>) -> Subscription {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries.borrow_mut().push((id, event.to_string(), handler));
        let entries = Rc::downgrade(&self.entries);
        Subscription::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|(entry_id, _, _)| *entry_id != id);
            }
        })
    }

    fn emit(&self, event: &str, payload: Value) {
        let handlers: Vec<Rc<dyn Fn(Value)>> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(payload.clone());
        }
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

pub(crate) struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(Duration::from_millis(u64::from(ms))))
    }
}

// ============================================================================
// Injected provider
// ============================================================================

pub(crate) struct MockEthereum {
    accounts: RefCell<Vec<String>>,
    authorized: Cell<bool>,
    chain: RefCell<String>,
    known_chains: RefCell<HashSet<String>>,
    failures: RefCell<HashMap<String, WalletError>>,
    request_delay_ms: Cell<u64>,
    calls: RefCell<Vec<(String, Option<Value>)>>,
    listeners: Listeners,
}

impl MockEthereum {
    pub(crate) fn new(accounts: &[&str], chain: &str) -> Rc<Self> {
        Rc::new(Self {
            accounts: RefCell::new(accounts.iter().map(|a| a.to_string()).collect()),
            authorized: Cell::new(true),
            chain: RefCell::new(chain.to_string()),
            known_chains: RefCell::new(HashSet::from([chain.to_string()])),
            failures: RefCell::new(HashMap::new()),
            request_delay_ms: Cell::new(0),
            calls: RefCell::new(Vec::new()),
            listeners: Listeners::default(),
        })
    }

    /// Every request of `method` fails with `err` from now on.
    pub(crate) fn fail(&self, method: &str, err: WalletError) {
        self.failures.borrow_mut().insert(method.to_string(), err);
    }

    /// `eth_requestAccounts` takes this long to be approved.
    pub(crate) fn delay_approval(&self, ms: u64) {
        self.request_delay_ms.set(ms);
    }

    pub(crate) fn know_chain(&self, chain: &str) {
        self.known_chains.borrow_mut().insert(chain.to_string());
    }

    /// The user revoked the dApp's permission in the extension.
    pub(crate) fn revoke(&self) {
        self.authorized.set(false);
    }

    pub(crate) fn set_accounts(&self, accounts: &[&str]) {
        *self.accounts.borrow_mut() = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub(crate) fn chain(&self) -> String {
        self.chain.borrow().clone()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(method, _)| method.clone()).collect()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }

    pub(crate) fn last_params(&self, method: &str) -> Option<Value> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .and_then(|(_, params)| params.clone())
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&self, event: &str, payload: Value) {
        self.listeners.emit(event, payload);
    }

    fn accounts_json(&self) -> Value {
        if self.authorized.get() {
            json!(*self.accounts.borrow())
        } else {
            json!([])
        }
    }

    fn requested_chain(params: &Option<Value>) -> String {
        params
            .as_ref()
            .and_then(|p| p[0]["chainId"].as_str())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

#[async_trait(?Send)]
impl Eip1193 for MockEthereum {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.calls.borrow_mut().push((method.to_string(), params.clone()));
        let failure = self.failures.borrow().get(method).cloned();
        if let Some(err) = failure {
            return Err(err);
        }

        match method {
            methods::ETH_REQUEST_ACCOUNTS => {
                let delay = self.request_delay_ms.get();
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                self.authorized.set(true);
                Ok(self.accounts_json())
            }
            methods::ETH_ACCOUNTS => Ok(self.accounts_json()),
            methods::ETH_CHAIN_ID => Ok(json!(self.chain())),
            methods::WALLET_REQUEST_PERMISSIONS => {
                self.authorized.set(true);
                Ok(json!([{ "parentCapability": "eth_accounts" }]))
            }
            methods::WALLET_SWITCH_ETHEREUM_CHAIN => {
                let target = Self::requested_chain(&params);
                if !self.known_chains.borrow().contains(&target) {
                    return Err(WalletError::from_rpc(4902, format!("Unrecognized chain ID \"{target}\"")));
                }
                if *self.chain.borrow() != target {
                    *self.chain.borrow_mut() = target.clone();
                    self.emit(events::CHAIN_CHANGED, json!(target));
                }
                Ok(Value::Null)
            }
            methods::WALLET_ADD_ETHEREUM_CHAIN => {
                let target = Self::requested_chain(&params);
                self.known_chains.borrow_mut().insert(target.clone());
                *self.chain.borrow_mut() = target;
                Ok(Value::Null)
            }
            other => Err(WalletError::from_rpc(4200, format!("{other} not supported"))),
        }
    }

    fn on(&self, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription {
        self.listeners.add(event, handler)
    }
}

#[derive(Default)]
pub(crate) struct MockBrowser {
    injected: RefCell<Vec<(Vec<&'static str>, Rc<MockEthereum>)>>,
    opened: RefCell<Vec<String>>,
    alerts: RefCell<Vec<String>>,
}

impl MockBrowser {
    pub(crate) fn inject(&self, flags: &[&'static str], provider: Rc<MockEthereum>) {
        self.injected.borrow_mut().push((flags.to_vec(), provider));
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    pub(crate) fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl BrowserEnv for MockBrowser {
    fn injected(&self, detection: &InjectedDetection) -> Option<Rc<dyn Eip1193>> {
        self.injected
            .borrow()
            .iter()
            .find(|(flags, _)| detection.matches(|flag| flags.iter().any(|set| *set == flag)))
            .map(|(_, provider)| provider.clone() as Rc<dyn Eip1193>)
    }

    fn open_in_new_tab(&self, url: &str) {
        self.opened.borrow_mut().push(url.to_string());
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

// ============================================================================
// Pairing SDK
// ============================================================================

/// How a mock pairing client answers `connect()`.
#[derive(Debug, Clone)]
pub(crate) enum PairingScript {
    /// Wallet approves after `delay_ms`; `connect()` resolves.
    Approve { accounts: Vec<String>, delay_ms: u64 },
    /// Approval only surfaces as an `accountsChanged` event; `connect()` never resolves.
    ApproveViaEvent { accounts: Vec<String>, delay_ms: u64 },
    /// Accounts appear on the client without any notification.
    SilentAccounts { accounts: Vec<String>, delay_ms: u64 },
    Reject(WalletError),
    /// Wallet emits `disconnect` after `delay_ms`.
    DropAfter(u64),
    /// Nothing ever happens.
    Hang,
}

pub(crate) struct MockModal {
    open: Cell<bool>,
    closes: Cell<usize>,
    listeners: RefCell<Vec<(u64, Rc<dyn Fn(bool)>)>>,
    next_id: Cell<u64>,
}

impl MockModal {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            open: Cell::new(false),
            closes: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.get()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.get()
    }

    /// The user dismisses the QR modal.
    pub(crate) fn user_closes(&self) {
        self.open.set(false);
        let handlers: Vec<_> = self.listeners.borrow().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(false);
        }
    }
}

impl PairingModal for MockModal {
    fn close_modal(&self) {
        self.closes.set(self.closes.get() + 1);
        self.open.set(false);
    }

    fn subscribe_modal(&self, handler: Rc<dyn Fn(bool)>) -> Subscription {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.listeners.borrow_mut().push((id, handler));
        Subscription::noop()
    }
}

pub(crate) struct MockPairingClient {
    script: PairingScript,
    accounts: RefCell<Vec<String>>,
    chain: Cell<u64>,
    modal: Rc<MockModal>,
    disconnect_error: RefCell<Option<WalletError>>,
    disconnects: Cell<usize>,
    requests: RefCell<Vec<(String, Option<Value>)>>,
    listeners: Listeners,
}

impl MockPairingClient {
    pub(crate) fn accounts_now(&self) -> Vec<String> {
        self.accounts.borrow().clone()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.get()
    }

    pub(crate) fn fail_disconnect(&self, err: WalletError) {
        *self.disconnect_error.borrow_mut() = Some(err);
    }

    pub(crate) fn modal(&self) -> &Rc<MockModal> {
        &self.modal
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&self, event: &str, payload: Value) {
        self.listeners.emit(event, payload);
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait(?Send)]
impl Eip1193 for MockPairingClient {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.requests.borrow_mut().push((method.to_string(), params.clone()));
        match method {
            methods::WALLET_SWITCH_ETHEREUM_CHAIN => {
                let target = params
                    .as_ref()
                    .and_then(|p| p[0]["chainId"].as_str())
                    .and_then(shared::chains::parse_chain_id)
                    .ok_or_else(|| WalletError::provider("bad params"))?;
                self.chain.set(target);
                self.emit(events::CHAIN_CHANGED, json!(to_hex_chain_id(target)));
                Ok(Value::Null)
            }
            methods::ETH_ACCOUNTS => Ok(json!(self.accounts_now())),
            _ => Ok(Value::Null),
        }
    }

    fn on(&self, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription {
        self.listeners.add(event, handler)
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.set(self.disconnects.get() + 1);
        let failure = self.disconnect_error.borrow().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        self.accounts.borrow_mut().clear();
        Ok(())
    }
}

#[async_trait(?Send)]
impl PairingClient for MockPairingClient {
    async fn connect(&self) -> Result<()> {
        self.modal.open.set(true);
        match self.script.clone() {
            PairingScript::Approve { accounts, delay_ms } => {
                pause(delay_ms).await;
                *self.accounts.borrow_mut() = accounts;
                self.modal.open.set(false);
                self.emit(events::CONNECT, json!({ "chainId": "0x1" }));
                Ok(())
            }
            PairingScript::ApproveViaEvent { accounts, delay_ms } => {
                pause(delay_ms).await;
                *self.accounts.borrow_mut() = accounts.clone();
                self.emit(events::ACCOUNTS_CHANGED, json!(accounts));
                futures::future::pending().await
            }
            PairingScript::SilentAccounts { accounts, delay_ms } => {
                pause(delay_ms).await;
                *self.accounts.borrow_mut() = accounts;
                futures::future::pending().await
            }
            PairingScript::Reject(err) => Err(err),
            PairingScript::DropAfter(delay_ms) => {
                pause(delay_ms).await;
                self.emit(events::DISCONNECT, json!({ "code": 6000, "message": "session expired" }));
                futures::future::pending().await
            }
            PairingScript::Hang => futures::future::pending().await,
        }
    }

    fn accounts(&self) -> Vec<String> {
        self.accounts_now()
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.chain.get())
    }
}

pub(crate) struct MockPairingFactory {
    script: RefCell<PairingScript>,
    /// Accounts a freshly created client already has (rehydrated session).
    rehydrated: RefCell<Vec<String>>,
    create_delay_ms: Cell<u64>,
    fail_next: RefCell<Option<WalletError>>,
    clients: RefCell<Vec<Rc<MockPairingClient>>>,
    options: RefCell<Option<PairingOptions>>,
}

impl MockPairingFactory {
    pub(crate) fn new(script: PairingScript) -> Rc<Self> {
        Rc::new(Self {
            script: RefCell::new(script),
            rehydrated: RefCell::new(Vec::new()),
            create_delay_ms: Cell::new(0),
            fail_next: RefCell::new(None),
            clients: RefCell::new(Vec::new()),
            options: RefCell::new(None),
        })
    }

    pub(crate) fn script(&self, script: PairingScript) {
        *self.script.borrow_mut() = script;
    }

    pub(crate) fn rehydrate(&self, accounts: &[&str]) {
        *self.rehydrated.borrow_mut() = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub(crate) fn delay_creation(&self, ms: u64) {
        self.create_delay_ms.set(ms);
    }

    pub(crate) fn fail_next(&self, err: WalletError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    pub(crate) fn created(&self) -> usize {
        self.clients.borrow().len()
    }

    pub(crate) fn last(&self) -> Option<Rc<MockPairingClient>> {
        self.clients.borrow().last().cloned()
    }

    pub(crate) fn last_options(&self) -> Option<PairingOptions> {
        self.options.borrow().clone()
    }
}

#[async_trait(?Send)]
impl PairingClientFactory for MockPairingFactory {
    async fn create(&self, options: &PairingOptions) -> Result<PairingHandles> {
        pause(self.create_delay_ms.get()).await;
        *self.options.borrow_mut() = Some(options.clone());
        let failure = self.fail_next.borrow_mut().take();
        if let Some(err) = failure {
            return Err(err);
        }

        let modal = MockModal::new();
        let client = Rc::new(MockPairingClient {
            script: self.script.borrow().clone(),
            accounts: RefCell::new(self.rehydrated.borrow().clone()),
            chain: Cell::new(options.chains.first().copied().unwrap_or(1)),
            modal: modal.clone(),
            disconnect_error: RefCell::new(None),
            disconnects: Cell::new(0),
            requests: RefCell::new(Vec::new()),
            listeners: Listeners::default(),
        });
        self.clients.borrow_mut().push(client.clone());
        Ok(PairingHandles {
            client,
            modal: Some(modal),
        })
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub(crate) const ALICE: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
pub(crate) const BOB: &str = "0x2546BcD3c84621e976D8185a91A922aE77ECEc30";

pub(crate) struct Harness {
    pub(crate) config: Config,
    pub(crate) browser: Rc<MockBrowser>,
    pub(crate) factory: Rc<MockPairingFactory>,
    pub(crate) persistence: WalletPersistence,
    pub(crate) session: Rc<SessionManager>,
    pub(crate) registry: ProviderRegistry,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_script(PairingScript::Approve {
            accounts: vec![ALICE.to_string()],
            delay_ms: 1_000,
        })
    }

    pub(crate) fn with_script(script: PairingScript) -> Self {
        let config = Config::default();
        let browser = Rc::new(MockBrowser::default());
        let factory = MockPairingFactory::new(script);
        let session = SessionManager::new(factory.clone(), Rc::new(TokioTimer), &config);
        let registry = ProviderRegistry::new(browser.clone(), session.clone());
        Self {
            config,
            browser,
            factory,
            persistence: WalletPersistence::in_memory(),
            session,
            registry,
        }
    }

    pub(crate) fn controller(&self) -> Rc<ConnectionController> {
        ConnectionController::new(
            self.registry.clone(),
            self.persistence.clone(),
            self.browser.clone(),
            Rc::new(TokioTimer),
            &self.config,
        )
    }

    /// Inject a MetaMask-flagged provider.
    pub(crate) fn metamask(&self, accounts: &[&str], chain: &str) -> Rc<MockEthereum> {
        let provider = MockEthereum::new(accounts, chain);
        self.browser.inject(&["isMetaMask"], provider.clone());
        provider
    }
}
