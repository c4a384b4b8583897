//! # Wallet Provider Registry
//!
//! The four supported wallet families, how each one is detected, and where
//! to send users who have not installed it. [`ProviderRegistry`] turns a
//! [`WalletKind`] into the adapter that talks to it.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::adapter::{InjectedAdapter, WalletAdapter, WalletConnectAdapter};
use crate::provider::BrowserEnv;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    MetaMask,
    Coinbase,
    Brave,
    WalletConnect,
}

impl WalletKind {
    pub const ALL: [WalletKind; 4] = [
        WalletKind::MetaMask,
        WalletKind::Coinbase,
        WalletKind::Brave,
        WalletKind::WalletConnect,
    ];

    /// Stable id, also the persisted value.
    pub fn id(self) -> &'static str {
        match self {
            WalletKind::MetaMask => "metamask",
            WalletKind::Coinbase => "coinbase",
            WalletKind::Brave => "brave",
            WalletKind::WalletConnect => "walletconnect",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn descriptor(self) -> &'static WalletDescriptor {
        match self {
            WalletKind::MetaMask => &WALLETS[0],
            WalletKind::Coinbase => &WALLETS[1],
            WalletKind::Brave => &WALLETS[2],
            WalletKind::WalletConnect => &WALLETS[3],
        }
    }

    /// Reached over a relay rather than an injected browser object.
    pub fn is_remote(self) -> bool {
        matches!(self.descriptor().detection, Detection::Remote)
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Marker flags identifying one injected wallet. Several wallets set
/// `isMetaMask` for compatibility, so a match also requires that none of
/// `excluded_flags` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedDetection {
    pub flag: &'static str,
    pub excluded_flags: &'static [&'static str],
}

impl InjectedDetection {
    pub fn matches(&self, has_flag: impl Fn(&str) -> bool) -> bool {
        has_flag(self.flag) && !self.excluded_flags.iter().any(|flag| has_flag(flag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Injected(InjectedDetection),
    /// Always available; needs no browser extension.
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub kind: WalletKind,
    pub display_name: &'static str,
    pub icon_url: &'static str,
    pub install_url: &'static str,
    pub detection: Detection,
}

pub static WALLETS: [WalletDescriptor; 4] = [
    WalletDescriptor {
        kind: WalletKind::MetaMask,
        display_name: "MetaMask",
        icon_url: "/assets/wallets/metamask.svg",
        install_url: "https://metamask.io/download/",
        detection: Detection::Injected(InjectedDetection {
            flag: "isMetaMask",
            excluded_flags: &["isBraveWallet"],
        }),
    },
    WalletDescriptor {
        kind: WalletKind::Coinbase,
        display_name: "Coinbase Wallet",
        icon_url: "/assets/wallets/coinbase.svg",
        install_url: "https://www.coinbase.com/wallet/downloads",
        detection: Detection::Injected(InjectedDetection {
            flag: "isCoinbaseWallet",
            excluded_flags: &[],
        }),
    },
    WalletDescriptor {
        kind: WalletKind::Brave,
        display_name: "Brave Wallet",
        icon_url: "/assets/wallets/brave.svg",
        install_url: "https://brave.com/wallet/",
        detection: Detection::Injected(InjectedDetection {
            flag: "isBraveWallet",
            excluded_flags: &[],
        }),
    },
    WalletDescriptor {
        kind: WalletKind::WalletConnect,
        display_name: "WalletConnect",
        icon_url: "/assets/wallets/walletconnect.svg",
        install_url: "https://walletconnect.com/",
        detection: Detection::Remote,
    },
];

/// Resolves wallet kinds to adapters.
#[derive(Clone)]
pub struct ProviderRegistry {
    browser: Rc<dyn BrowserEnv>,
    session: Rc<SessionManager>,
}

impl ProviderRegistry {
    pub fn new(browser: Rc<dyn BrowserEnv>, session: Rc<SessionManager>) -> Self {
        Self { browser, session }
    }

    pub fn adapter(&self, kind: WalletKind) -> Rc<dyn WalletAdapter> {
        match kind.descriptor().detection {
            Detection::Injected(detection) => {
                Rc::new(InjectedAdapter::new(kind, detection, self.browser.clone()))
            }
            Detection::Remote => Rc::new(WalletConnectAdapter::new(self.session.clone())),
        }
    }

    pub fn is_installed(&self, kind: WalletKind) -> bool {
        self.adapter(kind).detect_installed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, MockEthereum};

    #[test]
    fn ids_round_trip() {
        for kind in WalletKind::ALL {
            assert_eq!(WalletKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.descriptor().kind, kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.id().to_string())
            );
        }
        assert_eq!(WalletKind::from_id("phantom"), None);
    }

    #[test]
    fn brave_is_not_mistaken_for_metamask() {
        let brave_flags = ["isMetaMask", "isBraveWallet"];
        let has = |flag: &str| brave_flags.iter().any(|set| *set == flag);

        let Detection::Injected(metamask) = WalletKind::MetaMask.descriptor().detection else {
            panic!("metamask is injected");
        };
        let Detection::Injected(brave) = WalletKind::Brave.descriptor().detection else {
            panic!("brave is injected");
        };
        assert!(!metamask.matches(has));
        assert!(brave.matches(has));
    }

    #[test]
    fn installed_reflects_injected_objects() {
        let harness = Harness::new();
        harness
            .browser
            .inject(&["isCoinbaseWallet"], MockEthereum::new(&["0xabc"], "0x1"));

        let installed: Vec<WalletKind> = WalletKind::ALL
            .into_iter()
            .filter(|kind| harness.registry.is_installed(*kind))
            .collect();
        assert_eq!(installed, vec![WalletKind::Coinbase, WalletKind::WalletConnect]);
        assert!(WalletKind::WalletConnect.is_remote());
        assert!(!WalletKind::Brave.is_remote());
    }

    #[test]
    fn adapters_match_their_kind() {
        let harness = Harness::new();
        for kind in WalletKind::ALL {
            assert_eq!(harness.registry.adapter(kind).kind(), kind);
        }
    }
}
