//! Wallet Connect Widget - root component

use leptos::prelude::*;

use crate::components::Navbar;
use crate::state::wallet::provide_wallet_context;

#[component]
pub fn App() -> impl IntoView {
    let wallet_ctx = provide_wallet_context();

    // Re-attach a previous connection once the app is in the DOM
    Effect::new(move || {
        log::debug!("App mounted, attempting connection restore");
        wallet_ctx.restore();
    });

    view! {
        <div class="app-container">
            <Navbar/>
        </div>
    }
}
