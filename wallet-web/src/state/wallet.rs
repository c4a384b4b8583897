//! Wallet state management
//!
//! Wires the browser services into a [`ConnectionController`] and mirrors its
//! state into a signal the components render from.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use lib_core::core_config;
use lib_wallet::{
    ConnectOutcome, ConnectionController, ConnectionState, MenuTab, ProviderRegistry, SessionManager, WalletKind,
};

use crate::services::browser::{GlooTimer, WebBrowser};
use crate::services::storage::browser_persistence;
use crate::services::walletconnect::WalletConnectFactory;

/// Global wallet context
#[derive(Clone, Copy)]
pub struct WalletContext {
    pub state: RwSignal<ConnectionState>,
    controller: StoredValue<Rc<ConnectionController>, LocalStorage>,
}

impl WalletContext {
    pub fn new() -> Self {
        let config = core_config();
        let browser = Rc::new(WebBrowser);
        let timer = Rc::new(GlooTimer);

        let session = SessionManager::new(Rc::new(WalletConnectFactory), timer.clone(), config);
        let registry = ProviderRegistry::new(browser.clone(), session);
        let controller = ConnectionController::new(registry, browser_persistence(), browser, timer, config);

        let state = RwSignal::new(controller.state());
        controller.watch(move |snapshot| state.set(snapshot.clone()));

        Self {
            state,
            controller: StoredValue::new_local(controller),
        }
    }

    fn controller(&self) -> Rc<ConnectionController> {
        self.controller.get_value()
    }

    pub fn is_installed(&self, kind: WalletKind) -> bool {
        self.controller().registry().is_installed(kind)
    }

    pub fn connect(&self, kind: WalletKind) {
        let controller = self.controller();
        spawn_local(async move {
            match controller.connect(kind).await {
                ConnectOutcome::Connected => log::info!("Connected via {}", kind),
                ConnectOutcome::Failed(err) => log::warn!("{} connection failed: {}", kind, err),
                other => log::debug!("{} connect finished: {:?}", kind, other),
            }
        });
    }

    pub fn disconnect(&self) {
        let controller = self.controller();
        spawn_local(async move { controller.disconnect().await });
    }

    pub fn switch_chain(&self, chain_id: &'static str) {
        let controller = self.controller();
        spawn_local(async move {
            if let Err(err) = controller.switch_chain(chain_id).await {
                log::warn!("Chain switch to {} failed: {}", chain_id, err);
            }
        });
    }

    pub fn switch_account(&self, address: String) {
        let controller = self.controller();
        spawn_local(async move {
            if let Err(err) = controller.switch_account(&address).await {
                log::warn!("Account switch failed: {}", err);
            }
        });
    }

    pub fn restore(&self) {
        let controller = self.controller();
        spawn_local(async move {
            if controller.restore().await {
                log::info!("Previous wallet connection restored");
            }
        });
    }

    pub fn toggle_menu(&self) {
        self.controller().toggle_menu();
    }

    pub fn close_menu(&self) {
        self.controller().close_menu();
    }

    pub fn select_tab(&self, tab: MenuTab) {
        self.controller().select_tab(tab);
    }
}

impl Default for WalletContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn provide_wallet_context() -> WalletContext {
    let context = WalletContext::new();
    provide_context(context);
    context
}

pub fn use_wallet_context() -> WalletContext {
    expect_context::<WalletContext>()
}
