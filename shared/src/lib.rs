//! # Shared Wallet Data Library
//!
//! Static tables and wire types shared by the wallet core libraries and the
//! browser front-end.
//!
//! ## Structure
//!
//! - **[`chains`]**: the chain registry (every network the widget can show or switch to)
//! - **[`dto`]**: Data Transfer Objects exchanged with injected wallets and the pairing SDK
//!   - **[`dto::rpc`]**: EIP-1193 request payloads and the normalized `{code, message}` error
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::format_address`]**: Format wallet addresses for display
//!   - **[`utils::truncate_address`]**: Truncate addresses with ellipsis
//!
//! ## Wire Format
//!
//! Provider payloads follow the EIP-1193 / EIP-3085 conventions, which means
//! **camelCase** field names in JSON (`chainId`, `rpcUrls`, ...). Optional
//! fields are omitted when `None`.
//!
//! ## Usage
//!
//! ```rust
//! use shared::chains::lookup;
//! use shared::utils::truncate_address;
//!
//! let chain = lookup("0x89").expect("polygon is registered");
//! assert_eq!(chain.name, "Polygon");
//!
//! let label = truncate_address("0x71C7656EC7ab88b098defB751B7401B5f6d8976F");
//! assert_eq!(label, "0x71C7...976F");
//! ```

pub mod chains;
pub mod dto;
pub mod utils;

pub use chains::{lookup, ChainDescriptor, SUPPORTED_CHAINS};
pub use dto::*;
pub use utils::*;
