//! Browser implementations of the connection core's capability traits.
//!
//! Small conversion helpers between `serde_json::Value` and `JsValue` live
//! here; everything that talks to wallets goes through them.

pub mod browser;
pub mod ethereum;
pub mod storage;
pub mod walletconnect;

use js_sys::{Array, Function, Promise, Reflect};
use lib_core::{Result, WalletError};
use serde::Serialize;
use serde_json::Value;
use shared::dto::rpc::ProviderRpcError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Serialize into a plain JS value. Maps become objects, not `Map`s, since
/// wallets read their arguments with property access.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| WalletError::provider(format!("Failed to encode request: {}", e)))
}

pub(crate) fn from_js(value: JsValue) -> Value {
    serde_wasm_bindgen::from_value(value).unwrap_or(Value::Null)
}

/// Normalize a rejection into the error taxonomy. Wallets reject with
/// `{code, message}` objects (often `Error` instances); anything else is a
/// generic provider error.
pub(crate) fn js_error(err: JsValue) -> WalletError {
    match serde_wasm_bindgen::from_value::<ProviderRpcError>(err.clone()) {
        Ok(rpc) => rpc.into(),
        Err(_) => {
            let message = Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
                .or_else(|| err.as_string())
                .unwrap_or_else(|| format!("{:?}", err));
            WalletError::provider(message)
        }
    }
}

pub(crate) fn get_function(target: &JsValue, name: &str) -> Result<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(|_| WalletError::ProviderUnavailable(format!("Provider has no {}()", name)))
}

/// `await target[name](...args)`. Plain return values resolve immediately.
pub(crate) async fn call_async(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue> {
    let function = get_function(target, name)?;
    let result = function
        .apply(target, &args.iter().collect::<Array>())
        .map_err(js_error)?;

    JsFuture::from(Promise::resolve(&result)).await.map_err(js_error)
}

pub(crate) fn flag(target: &JsValue, name: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}
