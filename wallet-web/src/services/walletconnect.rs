//! WalletConnect `EthereumProvider` bindings
//!
//! The SDK is loaded lazily the first time a pairing session is created:
//! either from a global the host page bundles, or from the ESM CDN.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Reflect};
use lib_core::Result;
use lib_wallet::{Eip1193, PairingClient, PairingClientFactory, PairingHandles, PairingModal, PairingOptions, Subscription};
use serde_json::Value;
use shared::dto::rpc::{accounts_from_value, RequestArguments};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::ethereum::listen;
use super::{call_async, from_js, get_function, js_error, to_js};

#[wasm_bindgen(inline_js = "
export async function initEthereumProvider(options) {
    const module = window.WalletConnectEthereumProvider
        ?? await import('https://esm.sh/@walletconnect/ethereum-provider@2.17.0');
    const EthereumProvider = module.EthereumProvider ?? module.default;
    return await EthereumProvider.init(options);
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn initEthereumProvider(options: JsValue) -> std::result::Result<JsValue, JsValue>;
}

/// Creates `EthereumProvider` instances.
#[derive(Debug, Default)]
pub struct WalletConnectFactory;

#[async_trait(?Send)]
impl PairingClientFactory for WalletConnectFactory {
    async fn create(&self, options: &PairingOptions) -> Result<PairingHandles> {
        log::info!(
            "Initializing WalletConnect provider for {} chains",
            options.optional_chains.len()
        );
        let provider = initEthereumProvider(to_js(options)?).await.map_err(js_error)?;

        let modal = Reflect::get(&provider, &JsValue::from_str("modal"))
            .ok()
            .filter(|m| m.is_object())
            .map(|inner| Rc::new(WalletConnectModal { inner }) as Rc<dyn PairingModal>);

        Ok(PairingHandles {
            client: Rc::new(WalletConnectClient { inner: provider }),
            modal,
        })
    }
}

/// One `EthereumProvider` instance.
pub struct WalletConnectClient {
    inner: JsValue,
}

impl WalletConnectClient {
    fn property(&self, name: &str) -> JsValue {
        Reflect::get(&self.inner, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
    }
}

#[async_trait(?Send)]
impl Eip1193 for WalletConnectClient {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        log::debug!("walletconnect.request {}", method);
        let args = to_js(&RequestArguments::new(method, params))?;
        let result = call_async(&self.inner, "request", &[args]).await?;
        Ok(from_js(result))
    }

    fn on(&self, event: &'static str, handler: Rc<dyn Fn(Value)>) -> Subscription {
        listen(&self.inner, event, handler)
    }

    async fn disconnect(&self) -> Result<()> {
        call_async(&self.inner, "disconnect", &[]).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PairingClient for WalletConnectClient {
    async fn connect(&self) -> Result<()> {
        call_async(&self.inner, "connect", &[]).await?;
        Ok(())
    }

    fn accounts(&self) -> Vec<String> {
        accounts_from_value(&from_js(self.property("accounts")))
    }

    fn chain_id(&self) -> Option<u64> {
        self.property("chainId")
            .as_f64()
            .filter(|id| *id > 0.0)
            .map(|id| id as u64)
    }
}

/// The QR modal bundled with the provider.
pub struct WalletConnectModal {
    inner: JsValue,
}

impl PairingModal for WalletConnectModal {
    fn close_modal(&self) {
        let closed = Reflect::get(&self.inner, &JsValue::from_str("closeModal"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .map(|close| close.call0(&self.inner));
        if !matches!(closed, Some(Ok(_))) {
            log::debug!("WalletConnect modal could not be closed");
        }
    }

    fn subscribe_modal(&self, handler: Rc<dyn Fn(bool)>) -> Subscription {
        let Ok(subscribe) = get_function(&self.inner, "subscribeModal") else {
            log::debug!("WalletConnect modal does not support subscriptions");
            return Subscription::noop();
        };

        let listener = ModalListener::new(handler);
        let callback = listener.clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |state: JsValue| {
            let open = Reflect::get(&state, &JsValue::from_str("open"))
                .ok()
                .and_then(|o| o.as_bool())
                .unwrap_or(false);
            callback.notify(open);
        });

        let unsubscribe = match subscribe.call1(&self.inner, closure.as_ref().unchecked_ref()) {
            Ok(returned) => returned.dyn_into::<Function>().ok(),
            Err(err) => {
                log::debug!("Modal subscribe failed: {:?}", err);
                return Subscription::noop();
            }
        };

        let Some(unsubscribe) = unsubscribe else {
            // Registered with no way to unregister: JS keeps calling the
            // closure, so it must outlive this handle. Muting stops delivery.
            log::debug!("WalletConnect modal returned no unsubscribe function");
            closure.forget();
            return Subscription::new(move || listener.mute());
        };

        Subscription::new(move || {
            listener.mute();
            if let Err(err) = unsubscribe.call0(&JsValue::NULL) {
                log::debug!("Modal unsubscribe failed: {:?}", err);
            }
            leptos::task::spawn_local(async move { drop(closure) });
        })
    }
}

/// Modal open/close handler that can be silenced once its subscription ends.
#[derive(Clone)]
struct ModalListener {
    handler: Rc<dyn Fn(bool)>,
    active: Rc<Cell<bool>>,
}

impl ModalListener {
    fn new(handler: Rc<dyn Fn(bool)>) -> Self {
        Self {
            handler,
            active: Rc::new(Cell::new(true)),
        }
    }

    fn notify(&self, open: bool) {
        if self.active.get() {
            (self.handler)(open);
        }
    }

    fn mute(&self) {
        self.active.set(false);
    }
}
