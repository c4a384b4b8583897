//! # Provider Adapters
//!
//! One [`WalletAdapter`] per vendor family, so the controller never branches
//! on the provider kind for protocol details:
//!
//! | Family | Connect | Account switch | Chain switch |
//! |--------|---------|----------------|--------------|
//! | Injected (MetaMask, Coinbase, Brave) | permissions + `eth_requestAccounts` | re-request permissions | switch, add on 4902 |
//! | WalletConnect | pairing session | local only | via pairing session |

use std::rc::Rc;

use async_trait::async_trait;
use lib_core::{Result, WalletError};
use serde_json::Value;
use shared::chains::{lookup, parse_chain_id, to_hex_chain_id};
use shared::dto::rpc::{
    account_permission_params, accounts_from_value, add_chain_params, events, methods,
    switch_chain_params,
};

use crate::events::{normalize_chain_payload, EventHandler, ProviderEvent, Subscription};
use crate::provider::{BrowserEnv, Eip1193};
use crate::registry::{InjectedDetection, WalletKind};
use crate::session::SessionManager;

/// Result of an approved connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub accounts: Vec<String>,
    /// Lowercase hex chain id, when the wallet reported one.
    pub chain_id: Option<String>,
}

#[async_trait(?Send)]
pub trait WalletAdapter {
    fn kind(&self) -> WalletKind;

    fn detect_installed(&self) -> bool;

    /// Prompt the user for account access.
    async fn request_connection(&self) -> Result<Connection>;

    /// Silently re-attach to a previously approved connection. `None` when
    /// the wallet no longer grants any account.
    async fn restore_connection(&self) -> Result<Option<Connection>>;

    /// Ask the wallet for a fresh account list. `None` means the wallet
    /// cannot change accounts from here and the switch stays local.
    async fn refresh_accounts(&self) -> Result<Option<Vec<String>>>;

    async fn switch_chain(&self, chain_id: &str) -> Result<()>;

    fn subscribe(&self, handler: EventHandler) -> Vec<Subscription>;

    async fn disconnect(&self) -> Result<()>;
}

// ============================================================================
// Injected providers
// ============================================================================

pub struct InjectedAdapter {
    kind: WalletKind,
    detection: InjectedDetection,
    browser: Rc<dyn BrowserEnv>,
}

impl InjectedAdapter {
    pub fn new(kind: WalletKind, detection: InjectedDetection, browser: Rc<dyn BrowserEnv>) -> Self {
        Self {
            kind,
            detection,
            browser,
        }
    }

    fn provider(&self) -> Result<Rc<dyn Eip1193>> {
        self.browser.injected(&self.detection).ok_or_else(|| {
            WalletError::ProviderUnavailable(format!(
                "{} is not installed",
                self.kind.descriptor().display_name
            ))
        })
    }
}

/// Some wallets (older Coinbase builds, mobile in-app browsers) do not
/// implement `wallet_requestPermissions`; account access then falls back to
/// `eth_requestAccounts` alone.
async fn request_account_permission(provider: &dyn Eip1193) -> Result<()> {
    match provider
        .request(methods::WALLET_REQUEST_PERMISSIONS, Some(account_permission_params()))
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if err.is_unsupported_method() => {
            tracing::debug!(error = %err, "wallet_requestPermissions unsupported, continuing");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Failure to read the chain is not a connection failure.
async fn current_chain(provider: &dyn Eip1193) -> Option<String> {
    match provider.request(methods::ETH_CHAIN_ID, None).await {
        Ok(value) => normalize_chain_payload(&value),
        Err(err) => {
            tracing::debug!(error = %err, "eth_chainId failed");
            None
        }
    }
}

#[async_trait(?Send)]
impl WalletAdapter for InjectedAdapter {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    fn detect_installed(&self) -> bool {
        self.browser.injected(&self.detection).is_some()
    }

    async fn request_connection(&self) -> Result<Connection> {
        let provider = self.provider()?;
        request_account_permission(&*provider).await?;

        let accounts = accounts_from_value(&provider.request(methods::ETH_REQUEST_ACCOUNTS, None).await?);
        let chain_id = if accounts.is_empty() {
            None
        } else {
            current_chain(&*provider).await
        };
        Ok(Connection { accounts, chain_id })
    }

    async fn restore_connection(&self) -> Result<Option<Connection>> {
        let Some(provider) = self.browser.injected(&self.detection) else {
            return Ok(None);
        };
        let accounts = accounts_from_value(&provider.request(methods::ETH_ACCOUNTS, None).await?);
        if accounts.is_empty() {
            return Ok(None);
        }
        let chain_id = current_chain(&*provider).await;
        Ok(Some(Connection { accounts, chain_id }))
    }

    async fn refresh_accounts(&self) -> Result<Option<Vec<String>>> {
        let provider = self.provider()?;
        request_account_permission(&*provider).await?;
        let accounts = accounts_from_value(&provider.request(methods::ETH_ACCOUNTS, None).await?);
        Ok(Some(accounts))
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        let provider = self.provider()?;
        let params = switch_chain_params(chain_id);

        match provider
            .request(methods::WALLET_SWITCH_ETHEREUM_CHAIN, Some(params.clone()))
            .await
        {
            Ok(_) => Ok(()),
            Err(WalletError::UnrecognizedChain(_)) => {
                let chain = lookup(chain_id)
                    .ok_or_else(|| WalletError::UnsupportedChain(chain_id.to_string()))?;
                tracing::info!(
                    provider = %self.kind,
                    chain = chain.name,
                    "wallet does not know chain, requesting add"
                );
                provider
                    .request(
                        methods::WALLET_ADD_ETHEREUM_CHAIN,
                        Some(add_chain_params(&chain.add_chain_params())),
                    )
                    .await?;
                // Most wallets switch as part of the add; repeat for the rest.
                provider
                    .request(methods::WALLET_SWITCH_ETHEREUM_CHAIN, Some(params))
                    .await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn subscribe(&self, handler: EventHandler) -> Vec<Subscription> {
        let Some(provider) = self.browser.injected(&self.detection) else {
            return Vec::new();
        };
        [events::ACCOUNTS_CHANGED, events::CHAIN_CHANGED, events::DISCONNECT]
            .into_iter()
            .map(|event| {
                let handler = handler.clone();
                provider.on(
                    event,
                    Rc::new(move |payload: Value| {
                        if let Some(decoded) = ProviderEvent::from_notification(event, &payload) {
                            handler(decoded);
                        }
                    }),
                )
            })
            .collect()
    }

    async fn disconnect(&self) -> Result<()> {
        match self.browser.injected(&self.detection) {
            Some(provider) => provider.disconnect().await,
            None => Ok(()),
        }
    }
}

// ============================================================================
// WalletConnect
// ============================================================================

pub struct WalletConnectAdapter {
    session: Rc<SessionManager>,
}

impl WalletConnectAdapter {
    pub fn new(session: Rc<SessionManager>) -> Self {
        Self { session }
    }

    fn session_chain(&self) -> Option<String> {
        self.session.chain_id().map(to_hex_chain_id)
    }
}

#[async_trait(?Send)]
impl WalletAdapter for WalletConnectAdapter {
    fn kind(&self) -> WalletKind {
        WalletKind::WalletConnect
    }

    fn detect_installed(&self) -> bool {
        true
    }

    async fn request_connection(&self) -> Result<Connection> {
        // A half-finished pairing from an earlier attempt would keep its
        // stale modal and listeners.
        if !self.session.is_connected() {
            self.session.reset();
        }
        let accounts = self.session.connect().await?;
        Ok(Connection {
            accounts,
            chain_id: self.session_chain(),
        })
    }

    async fn restore_connection(&self) -> Result<Option<Connection>> {
        Ok(self.session.restore().await?.map(|accounts| Connection {
            accounts,
            chain_id: self.session_chain(),
        }))
    }

    async fn refresh_accounts(&self) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        let numeric =
            parse_chain_id(chain_id).ok_or_else(|| WalletError::UnsupportedChain(chain_id.to_string()))?;
        self.session.switch_chain(numeric).await
    }

    fn subscribe(&self, handler: EventHandler) -> Vec<Subscription> {
        vec![self.session.subscribe(handler)]
    }

    async fn disconnect(&self) -> Result<()> {
        self.session.disconnect().await;
        Ok(())
    }
}
