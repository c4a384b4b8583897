//! Injected EIP-1193 providers (`window.ethereum`)
//!
//! Extensions inject a single `window.ethereum`; when several are installed
//! the winner exposes the others under `window.ethereum.providers`. Vendors
//! are told apart by their `is*` flags.

use std::rc::Rc;

use async_trait::async_trait;
use lib_core::Result;
use lib_wallet::registry::InjectedDetection;
use lib_wallet::{Eip1193, Subscription};
use serde_json::Value;
use shared::dto::rpc::RequestArguments;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::{call_async, flag, from_js, get_function, to_js};

// ============================================================================
// DISCOVERY (JavaScript Interop)
// ============================================================================

#[wasm_bindgen(inline_js = "
export function injectedProviders() {
    const ethereum = window.ethereum;
    if (!ethereum) {
        return [];
    }
    if (Array.isArray(ethereum.providers) && ethereum.providers.length > 0) {
        return ethereum.providers;
    }
    return [ethereum];
}
")]
extern "C" {
    fn injectedProviders() -> js_sys::Array;
}

/// First injected provider whose flags match `detection`.
pub fn find_injected(detection: &InjectedDetection) -> Option<InjectedProvider> {
    injectedProviders()
        .iter()
        .find(|candidate| detection.matches(|name| flag(candidate, name)))
        .map(InjectedProvider::new)
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Handle on one injected provider object.
#[derive(Clone)]
pub struct InjectedProvider {
    inner: JsValue,
}

impl InjectedProvider {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }
}

#[async_trait(?Send)]
impl Eip1193 for InjectedProvider {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        log::debug!("ethereum.request {}", method);
        let args = to_js(&RequestArguments::new(method, params))?;
        let result = call_async(&self.inner, "request", &[args]).await?;
        Ok(from_js(result))
    }

    fn on(&self, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription {
        listen(&self.inner, event, handler)
    }
}

/// `target.on(event, cb)` with a subscription that calls
/// `target.removeListener(event, cb)`.
pub(crate) fn listen(target: &JsValue, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription {
    let closure = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
        handler(from_js(payload));
    });

    let registered = get_function(target, "on").and_then(|on| {
        on.call2(target, &JsValue::from_str(event), closure.as_ref().unchecked_ref())
            .map_err(super::js_error)
    });
    if let Err(err) = registered {
        log::warn!("Could not subscribe to {}: {}", event, err);
        return Subscription::noop();
    }

    let target = target.clone();
    Subscription::new(move || {
        let removed = get_function(&target, "removeListener").and_then(|remove| {
            remove
                .call2(&target, &JsValue::from_str(event), closure.as_ref().unchecked_ref())
                .map_err(super::js_error)
        });
        if let Err(err) = removed {
            log::debug!("removeListener({}) failed: {}", event, err);
        }
        // The subscription may be dropped from inside this very callback
        leptos::task::spawn_local(async move { drop(closure) });
    })
}
