//! # Data Transfer Objects (DTOs)
//!
//! Structures exchanged with injected browser wallets (EIP-1193) and the
//! WalletConnect pairing SDK, which speaks the same request shape.
//!
//! ## Module Organization
//!
//! - [`rpc`] - request arguments, chain switch/add payloads, permission requests
//!   and the normalized provider error
//!
//! ## Serialization Format
//!
//! - **Field naming**: camelCase, as wallets expect (`#[serde(rename_all = "camelCase")]`)
//! - **Optional fields**: omitted when `None` / empty
//!
//! ## Example JSON Communication
//!
//! ```text
//! ethereum.request({
//!   "method": "wallet_switchEthereumChain",
//!   "params": [{ "chainId": "0x89" }]
//! })
//! ```
//!
//! ```text
//! // rejected by the user
//! { "code": 4001, "message": "User rejected the request." }
//! ```

pub mod rpc;

pub use rpc::*;
