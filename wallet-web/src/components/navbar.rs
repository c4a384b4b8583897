//! Top navigation bar hosting the wallet widget

use leptos::prelude::*;

use crate::components::WalletConnect;

#[component]
pub fn Navbar() -> impl IntoView {
    view! {
        <nav class="navbar">
            <div style="max-width: 1200px; margin: 0 auto; padding: 0 24px; display: flex; justify-content: space-between; align-items: center;">
                <a href="/" class="nav-link-clean">
                    <span class="nav-title">
                        <span class="xf-red">"XF"</span><span class="terminal-white">"Wallet"</span>
                    </span>
                </a>
                <WalletConnect/>
            </div>
        </nav>
    }
}
