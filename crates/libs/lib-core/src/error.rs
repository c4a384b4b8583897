//! # Centralized Error Handling
//!
//! This module defines [`WalletError`], the error type shared by every wallet
//! provider family. Injected extensions and the remote pairing SDK both reject
//! with a `{code, message}` object; [`WalletError::from_rpc`] classifies that
//! shape so the controller can treat all providers uniformly.
//!
//! ## Error Categories
//!
//! 1. **User decisions**
//!    - [`UserRejected`](WalletError::UserRejected) → code 4001
//!
//! 2. **Chain problems**
//!    - [`UnrecognizedChain`](WalletError::UnrecognizedChain) → 4902, recoverable with an add-chain request
//!    - [`UnsupportedChain`](WalletError::UnsupportedChain) → 4901, not in the registry at all
//!
//! 3. **Provider / transport**
//!    - [`ConnectionTimeout`](WalletError::ConnectionTimeout) → -32002
//!    - [`ProviderUnavailable`](WalletError::ProviderUnavailable) → 4900
//!    - [`Provider`](WalletError::Provider) → whatever code the wallet reported
//!
//! 4. **Ambient**
//!    - [`Storage`](WalletError::Storage) / [`Config`](WalletError::Config) → -32603
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{WalletError, USER_REJECTED_CODE};
//!
//! let err = WalletError::from_rpc(USER_REJECTED_CODE, "User denied account authorization");
//! assert!(err.is_user_rejected());
//! assert_eq!(err.code(), 4001);
//! ```

use shared::dto::rpc::ProviderRpcError;
use thiserror::Error;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193: the requested method is not supported.
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;
/// EIP-1193: the provider is not connected to any chain.
pub const PROVIDER_DISCONNECTED_CODE: i64 = 4900;
/// EIP-1193: the provider is not connected to the requested chain.
pub const CHAIN_DISCONNECTED_CODE: i64 = 4901;
/// MetaMask: `wallet_switchEthereumChain` target is unknown to the wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC: method not found.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
/// JSON-RPC: internal error.
pub const INTERNAL_ERROR_CODE: i64 = -32603;
/// JSON-RPC: resource unavailable / request timed out.
pub const RESOURCE_UNAVAILABLE_CODE: i64 = -32002;

/// Convenience type alias for `Result<T, WalletError>`.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Error type covering every failure a wallet operation can report.
///
/// `Clone` so a single initialization result can be handed to every caller
/// awaiting the same in-flight pairing session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// The user declined the request in their wallet (code 4001).
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    /// The wallet has no entry for the requested chain (code 4902).
    ///
    /// Handled locally with a `wallet_addEthereumChain` request.
    #[error("Chain {0} is not recognized by the wallet")]
    UnrecognizedChain(String),

    /// The chain is not in the widget's registry.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    /// Remote pairing did not produce accounts within the wait budget (milliseconds).
    #[error("Connection timed out after {0} ms")]
    ConnectionTimeout(u32),

    /// No injected wallet object / no pairing session when one is required.
    #[error("Wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Any other rejection from the provider.
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    /// Browser key-value storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid widget configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Classify a raw `{code, message}` rejection.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => WalletError::UserRejected(message),
            UNRECOGNIZED_CHAIN_CODE => WalletError::UnrecognizedChain(message),
            // Some mobile wallets wrap the 4902 case in an internal error
            INTERNAL_ERROR_CODE if message.to_ascii_lowercase().contains("unrecognized chain") => {
                WalletError::UnrecognizedChain(message)
            }
            _ => WalletError::Provider { code, message },
        }
    }

    /// Generic provider error with an internal-error code.
    pub fn provider(message: impl Into<String>) -> Self {
        WalletError::Provider {
            code: INTERNAL_ERROR_CODE,
            message: message.into(),
        }
    }

    /// Numeric code in the EIP-1193 convention.
    pub fn code(&self) -> i64 {
        match self {
            WalletError::UserRejected(_) => USER_REJECTED_CODE,
            WalletError::UnrecognizedChain(_) => UNRECOGNIZED_CHAIN_CODE,
            WalletError::UnsupportedChain(_) => CHAIN_DISCONNECTED_CODE,
            WalletError::ConnectionTimeout(_) => RESOURCE_UNAVAILABLE_CODE,
            WalletError::ProviderUnavailable(_) => PROVIDER_DISCONNECTED_CODE,
            WalletError::Provider { code, .. } => *code,
            WalletError::Storage(_) | WalletError::Config(_) => INTERNAL_ERROR_CODE,
        }
    }

    pub fn is_user_rejected(&self) -> bool {
        matches!(self, WalletError::UserRejected(_))
    }

    /// `true` when the wallet simply does not implement the method.
    pub fn is_unsupported_method(&self) -> bool {
        matches!(
            self,
            WalletError::Provider { code, .. }
                if *code == UNSUPPORTED_METHOD_CODE || *code == METHOD_NOT_FOUND_CODE
        )
    }

    /// Normalized `{code, message}` shape.
    pub fn to_rpc(&self) -> ProviderRpcError {
        let message = match self {
            WalletError::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ProviderRpcError {
            code: self.code(),
            message,
        }
    }
}

impl From<ProviderRpcError> for WalletError {
    fn from(err: ProviderRpcError) -> Self {
        WalletError::from_rpc(err.code, err.message)
    }
}

/// Malformed provider payloads surface as internal provider errors.
impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::provider(format!("Malformed provider payload: {}", err))
    }
}
