use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC methods the widget sends to wallets.
pub mod methods {
    pub const ETH_ACCOUNTS: &str = "eth_accounts";
    pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ETH_CHAIN_ID: &str = "eth_chainId";
    pub const WALLET_REQUEST_PERMISSIONS: &str = "wallet_requestPermissions";
    pub const WALLET_SWITCH_ETHEREUM_CHAIN: &str = "wallet_switchEthereumChain";
    pub const WALLET_ADD_ETHEREUM_CHAIN: &str = "wallet_addEthereumChain";

    /// Methods the pairing session is allowed to relay (signing happens in the wallet).
    pub const PAIRING_METHODS: &[&str] = &[
        "eth_sendTransaction",
        "eth_signTransaction",
        "eth_sign",
        "personal_sign",
        "eth_signTypedData",
        "eth_signTypedData_v4",
        WALLET_SWITCH_ETHEREUM_CHAIN,
        WALLET_ADD_ETHEREUM_CHAIN,
    ];
}

/// Provider notification names.
pub mod events {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";

    /// Events the pairing session subscribes to.
    pub const PAIRING_EVENTS: &[&str] = &[CHAIN_CHANGED, ACCOUNTS_CHANGED, CONNECT, DISCONNECT];
}

/// Argument object of `provider.request(...)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestArguments {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            method: method.to_string(),
            params,
        }
    }
}

/// Single parameter of `wallet_switchEthereumChain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchEthereumChainParameter {
    pub chain_id: String,
}

/// Native currency block of an EIP-3085 request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Single parameter of `wallet_addEthereumChain` (EIP-3085).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icon_urls: Vec<String>,
}

/// Normalized provider error: the `{code, message}` shape both injected
/// wallets and the pairing SDK reject with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// `params` for `wallet_switchEthereumChain`.
pub fn switch_chain_params(chain_id: &str) -> Value {
    let param = SwitchEthereumChainParameter {
        chain_id: chain_id.to_string(),
    };
    json!([param])
}

/// `params` for `wallet_addEthereumChain`.
pub fn add_chain_params(chain: &AddEthereumChainParameter) -> Value {
    json!([chain])
}

/// `params` for `wallet_requestPermissions` asking for account access.
pub fn account_permission_params() -> Value {
    json!([{ "eth_accounts": {} }])
}

/// Extract an address list from an `eth_accounts`-style response.
/// Non-string entries are dropped.
pub fn accounts_from_value(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
