//! # Capability Seams
//!
//! Traits over everything the connection core needs from its host:
//!
//! - [`Eip1193`]: a wallet provider object (`request` / `on` / `removeListener`)
//! - [`PairingClient`] + [`PairingModal`]: the WalletConnect SDK instance and its QR modal
//! - [`PairingClientFactory`]: builds a fresh SDK instance
//! - [`BrowserEnv`]: injected-provider discovery, new tabs, alerts
//! - [`Timer`]: sleeping without a runtime dependency
//!
//! All traits are `?Send`: browser handles are single-threaded.

use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use lib_core::{Config, Result};
use serde::Serialize;
use serde_json::Value;
use shared::chains::{supported_numeric_ids, SUPPORTED_CHAINS};
use shared::dto::rpc::{events, methods};

use crate::events::Subscription;
use crate::registry::InjectedDetection;

/// EIP-1193 provider object.
#[async_trait(?Send)]
pub trait Eip1193 {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Register a listener for a provider notification. The returned
    /// [`Subscription`] removes it again when dropped.
    fn on(&self, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription;

    /// Providers that hold a remote session end it here; extensions have
    /// nothing to tear down.
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// Remote pairing SDK instance (WalletConnect `EthereumProvider`).
#[async_trait(?Send)]
pub trait PairingClient: Eip1193 {
    /// Open the pairing flow. Resolves when the wallet approves; may also
    /// never resolve if the SDK only reports approval through events.
    async fn connect(&self) -> Result<()>;

    /// Accounts of the current session, empty when unpaired.
    fn accounts(&self) -> Vec<String>;

    fn chain_id(&self) -> Option<u64>;
}

/// QR / deep-link modal bundled with the pairing SDK.
pub trait PairingModal {
    fn close_modal(&self);

    /// `handler(open)` fires whenever the modal opens or closes.
    fn subscribe_modal(&self, handler: Rc<dyn Fn(bool)>) -> Subscription;
}

/// A freshly created pairing client and its modal.
#[derive(Clone)]
pub struct PairingHandles {
    pub client: Rc<dyn PairingClient>,
    pub modal: Option<Rc<dyn PairingModal>>,
}

impl std::fmt::Debug for PairingHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingHandles")
            .field("accounts", &self.client.accounts())
            .field("chain_id", &self.client.chain_id())
            .field("modal", &self.modal.is_some())
            .finish()
    }
}

/// dApp metadata shown in the wallet while pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

/// Options handed to the SDK's `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingOptions {
    pub project_id: String,
    /// Chains the wallet must support.
    pub chains: Vec<u64>,
    /// Every registry chain, so switching does not need a re-pair.
    pub optional_chains: Vec<u64>,
    pub show_qr_modal: bool,
    pub methods: Vec<String>,
    pub events: Vec<String>,
    /// Numeric chain id (as string key) -> public RPC endpoint.
    pub rpc_map: BTreeMap<String, String>,
    pub metadata: PairingMetadata,
}

impl PairingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            project_id: config.walletconnect_project_id.clone(),
            chains: vec![config.primary_chain_id],
            optional_chains: supported_numeric_ids(),
            show_qr_modal: true,
            methods: methods::PAIRING_METHODS.iter().map(|m| m.to_string()).collect(),
            events: events::PAIRING_EVENTS.iter().map(|e| e.to_string()).collect(),
            rpc_map: SUPPORTED_CHAINS
                .iter()
                .map(|chain| (chain.numeric_id().to_string(), chain.rpc_url.to_string()))
                .collect(),
            metadata: PairingMetadata {
                name: config.app_name.clone(),
                description: config.app_description.clone(),
                url: config.app_url.clone(),
                icons: vec![config.app_icon.clone()],
            },
        }
    }

    /// Whether the session was configured with this chain.
    pub fn supports_chain(&self, chain_id: u64) -> bool {
        self.chains.contains(&chain_id) || self.optional_chains.contains(&chain_id)
    }
}

#[async_trait(?Send)]
pub trait PairingClientFactory {
    async fn create(&self, options: &PairingOptions) -> Result<PairingHandles>;
}

/// Host browser facilities.
pub trait BrowserEnv {
    /// The injected provider matching `detection`, searching both the
    /// top-level object and any multi-wallet `providers` list.
    fn injected(&self, detection: &InjectedDetection) -> Option<Rc<dyn Eip1193>>;

    fn open_in_new_tab(&self, url: &str);

    fn alert(&self, message: &str);
}

pub trait Timer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}
