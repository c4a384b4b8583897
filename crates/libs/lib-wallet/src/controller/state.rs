//! Render state of the wallet widget.

use shared::chains::{self, ChainDescriptor};
use shared::utils::truncate_address;

use crate::adapter::Connection;
use crate::registry::WalletKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuTab {
    #[default]
    Networks,
    Accounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub open: bool,
    pub tab: MenuTab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Snapshot of the connection as the UI sees it.
///
/// `active_account`, `known_accounts` and `active_provider` move together:
/// the account is set exactly when the list is non-empty and a provider is
/// set, and clearing one clears all three.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub active_account: Option<String>,
    pub known_accounts: Vec<String>,
    /// Lowercase hex chain id.
    pub active_chain_id: Option<String>,
    pub active_provider: Option<WalletKind>,
    /// Provider of an attempt in progress, for the spinner.
    pub pending_provider: Option<WalletKind>,
    pub menu: MenuState,
    pub loading: bool,
    pub disconnecting: bool,
}

impl ConnectionState {
    pub fn phase(&self) -> ConnectionPhase {
        if self.disconnecting {
            ConnectionPhase::Disconnecting
        } else if self.loading {
            ConnectionPhase::Connecting
        } else if self.active_account.is_some() {
            ConnectionPhase::Connected
        } else {
            ConnectionPhase::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.active_account.is_some()
    }

    pub fn is_consistent(&self) -> bool {
        let linked = !self.known_accounts.is_empty() && self.active_provider.is_some();
        match &self.active_account {
            Some(account) => linked && self.knows_account(account),
            None => self.known_accounts.is_empty() && self.active_provider.is_none(),
        }
    }

    pub fn knows_account(&self, address: &str) -> bool {
        self.known_accounts
            .iter()
            .any(|known| known.eq_ignore_ascii_case(address))
    }

    pub fn active_chain(&self) -> Option<&'static ChainDescriptor> {
        self.active_chain_id.as_deref().and_then(chains::lookup)
    }

    /// Tooltip naming the wallet's network, including chains outside the registry.
    pub fn network_label(&self) -> Option<String> {
        self.active_chain_id.as_deref().map(chains::chain_name)
    }

    /// Button text: the truncated account when connected.
    pub fn button_label(&self) -> String {
        match (&self.active_account, self.phase()) {
            (_, ConnectionPhase::Connecting) => "Connecting...".to_string(),
            (_, ConnectionPhase::Disconnecting) => "Disconnecting...".to_string(),
            (Some(account), _) => truncate_address(account),
            (None, _) => "Connect Wallet".to_string(),
        }
    }

    pub(crate) fn apply_connection(&mut self, kind: WalletKind, connection: Connection) {
        self.active_account = connection.accounts.first().cloned();
        self.known_accounts = connection.accounts;
        if connection.chain_id.is_some() {
            self.active_chain_id = connection.chain_id;
        }
        self.active_provider = Some(kind);
    }

    /// Keep the current account if the wallet still reports it, else take the first.
    pub(crate) fn apply_accounts(&mut self, accounts: Vec<String>) {
        let retained = self
            .active_account
            .as_ref()
            .and_then(|current| accounts.iter().find(|a| a.eq_ignore_ascii_case(current)).cloned());
        self.active_account = retained.or_else(|| accounts.first().cloned());
        self.known_accounts = accounts;
    }

    pub(crate) fn clear_connection(&mut self) {
        self.active_account = None;
        self.known_accounts.clear();
        self.active_chain_id = None;
        self.active_provider = None;
    }

    pub(crate) fn finish_attempt(&mut self) {
        self.loading = false;
        self.pending_provider = None;
    }
}
