//! Wallet connect button and its dropdown.
//!
//! Disconnected: the dropdown lists the supported wallets. Connected: it
//! shows the Networks / Accounts tabs and a Disconnect action.

use leptos::prelude::*;
use lib_wallet::registry::WALLETS;
use lib_wallet::{ConnectionPhase, MenuTab, WalletDescriptor};
use shared::chains::{ChainDescriptor, SUPPORTED_CHAINS};
use shared::utils::truncate_address;

use crate::state::wallet::use_wallet_context;

#[component]
pub fn WalletConnect() -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let state = wallet_ctx.state;

    let busy = move || {
        matches!(
            state.with(|s| s.phase()),
            ConnectionPhase::Connecting | ConnectionPhase::Disconnecting
        )
    };

    view! {
        <div class="wallet-connect">
            <button
                class="wallet-button"
                class=("wallet-button--connected", move || state.with(|s| s.is_connected()))
                disabled=busy
                title=move || state.with(|s| s.network_label())
                on:click=move |_| wallet_ctx.toggle_menu()
            >
                {move || state.with(|s| s.active_chain()).map(|chain| view! {
                    <img class="chain-icon" src=chain.icon_url alt=chain.name/>
                })}
                <span>{move || state.with(|s| s.button_label())}</span>
            </button>

            <Show when=move || state.with(|s| s.menu.open)>
                <div class="wallet-dropdown">
                    <Show
                        when=move || state.with(|s| s.is_connected())
                        fallback=|| view! { <ProviderList/> }
                    >
                        <ConnectedMenu/>
                    </Show>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn ProviderList() -> impl IntoView {
    let wallet_ctx = use_wallet_context();

    view! {
        <div class="wallet-list">
            <p class="wallet-list-title">"Select a wallet"</p>
            {WALLETS.iter().map(|wallet| view! { <ProviderRow wallet=wallet/> }).collect_view()}
        </div>
        <button class="wallet-dropdown-close" on:click=move |_| wallet_ctx.close_menu()>
            "Cancel"
        </button>
    }
}

#[component]
fn ProviderRow(wallet: &'static WalletDescriptor) -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let kind = wallet.kind;
    let installed = wallet_ctx.is_installed(kind);

    view! {
        <button class="wallet-item" on:click=move |_| wallet_ctx.connect(kind)>
            <img src=wallet.icon_url alt=wallet.display_name class="wallet-icon"/>
            <span class="wallet-name">{wallet.display_name}</span>
            {(!installed).then(|| view! { <span class="wallet-hint">"Install"</span> })}
        </button>
    }
}

#[component]
fn ConnectedMenu() -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let state = wallet_ctx.state;
    let tab = move || state.with(|s| s.menu.tab);

    view! {
        <div class="wallet-tabs">
            <button
                class="wallet-tab"
                class=("wallet-tab--active", move || tab() == MenuTab::Networks)
                on:click=move |_| wallet_ctx.select_tab(MenuTab::Networks)
            >
                "Networks"
            </button>
            <button
                class="wallet-tab"
                class=("wallet-tab--active", move || tab() == MenuTab::Accounts)
                on:click=move |_| wallet_ctx.select_tab(MenuTab::Accounts)
            >
                "Accounts"
            </button>
        </div>

        {move || match tab() {
            MenuTab::Networks => view! { <NetworkList/> }.into_any(),
            MenuTab::Accounts => view! { <AccountList/> }.into_any(),
        }}

        <button class="wallet-disconnect" on:click=move |_| wallet_ctx.disconnect()>
            "Disconnect"
        </button>
    }
}

#[component]
fn NetworkList() -> impl IntoView {
    view! {
        <div class="wallet-list">
            {SUPPORTED_CHAINS.iter().map(|chain| view! { <NetworkRow chain=chain/> }).collect_view()}
        </div>
    }
}

#[component]
fn NetworkRow(chain: &'static ChainDescriptor) -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let state = wallet_ctx.state;
    let chain_id = chain.id;
    let active = move || state.with(|s| s.active_chain_id.as_deref() == Some(chain_id));

    view! {
        <button
            class="wallet-item"
            class=("wallet-item--active", active)
            on:click=move |_| {
                if !active() {
                    wallet_ctx.switch_chain(chain_id);
                }
            }
        >
            <img src=chain.icon_url alt=chain.name class="chain-icon"/>
            <span class="wallet-name">{chain.name}</span>
        </button>
    }
}

#[component]
fn AccountList() -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let state = wallet_ctx.state;

    view! {
        <div class="wallet-list">
            <For
                each=move || state.with(|s| s.known_accounts.clone())
                key=|account| account.clone()
                let:account
            >
                <AccountRow account=account/>
            </For>
        </div>
    }
}

#[component]
fn AccountRow(account: String) -> impl IntoView {
    let wallet_ctx = use_wallet_context();
    let state = wallet_ctx.state;
    let label = truncate_address(&account);
    let title = account.clone();
    let selected = account.clone();
    let active = move || {
        state.with(|s| {
            s.active_account
                .as_deref()
                .is_some_and(|current| current.eq_ignore_ascii_case(&selected))
        })
    };

    view! {
        <button
            class="wallet-item"
            class=("wallet-item--active", active)
            title=title
            on:click=move |_| wallet_ctx.switch_account(account.clone())
        >
            <span class="wallet-address">{label}</span>
        </button>
    }
}
