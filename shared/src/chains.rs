//! # Chain Registry
//!
//! Static table of the EVM networks the widget supports. Lookups are pure and
//! synchronous; the table is used to render chain names/icons, to derive the
//! chain list handed to the pairing SDK, and to build `wallet_addEthereumChain`
//! payloads when a wallet does not know the requested network.
//!
//! Chain ids are the `0x`-prefixed lowercase hex strings wallets report from
//! `eth_chainId`.

use crate::dto::rpc::{AddEthereumChainParameter, NativeCurrency};

/// Immutable description of a supported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDescriptor {
    /// Hex chain id, e.g. `"0x1"`
    pub id: &'static str,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub native_currency_symbol: &'static str,
    pub explorer_url: &'static str,
    pub icon_url: &'static str,
}

impl ChainDescriptor {
    /// Numeric chain id (`0x89` -> 137).
    pub fn numeric_id(&self) -> u64 {
        // Table entries are checked by `registry_ids_are_valid_hex`.
        parse_chain_id(self.id).unwrap_or_default()
    }

    /// Payload for `wallet_addEthereumChain` (EIP-3085).
    pub fn add_chain_params(&self) -> AddEthereumChainParameter {
        AddEthereumChainParameter {
            chain_id: self.id.to_string(),
            chain_name: self.name.to_string(),
            native_currency: NativeCurrency {
                name: self.native_currency_symbol.to_string(),
                symbol: self.native_currency_symbol.to_string(),
                decimals: 18,
            },
            rpc_urls: vec![self.rpc_url.to_string()],
            block_explorer_urls: vec![self.explorer_url.to_string()],
            icon_urls: Vec::new(),
        }
    }
}

/// Every network the widget can display or switch to. Ethereum mainnet first.
pub const SUPPORTED_CHAINS: &[ChainDescriptor] = &[
    ChainDescriptor {
        id: "0x1",
        name: "Ethereum",
        rpc_url: "https://eth.llamarpc.com",
        native_currency_symbol: "ETH",
        explorer_url: "https://etherscan.io",
        icon_url: "/assets/chains/ethereum.svg",
    },
    ChainDescriptor {
        id: "0x38",
        name: "BNB Chain",
        rpc_url: "https://bsc-dataseed.binance.org",
        native_currency_symbol: "BNB",
        explorer_url: "https://bscscan.com",
        icon_url: "/assets/chains/bnb.svg",
    },
    ChainDescriptor {
        id: "0x89",
        name: "Polygon",
        rpc_url: "https://polygon-rpc.com",
        native_currency_symbol: "POL",
        explorer_url: "https://polygonscan.com",
        icon_url: "/assets/chains/polygon.svg",
    },
    ChainDescriptor {
        id: "0xa",
        name: "Optimism",
        rpc_url: "https://mainnet.optimism.io",
        native_currency_symbol: "ETH",
        explorer_url: "https://optimistic.etherscan.io",
        icon_url: "/assets/chains/optimism.svg",
    },
    ChainDescriptor {
        id: "0xa4b1",
        name: "Arbitrum One",
        rpc_url: "https://arb1.arbitrum.io/rpc",
        native_currency_symbol: "ETH",
        explorer_url: "https://arbiscan.io",
        icon_url: "/assets/chains/arbitrum.svg",
    },
    ChainDescriptor {
        id: "0x2105",
        name: "Base",
        rpc_url: "https://mainnet.base.org",
        native_currency_symbol: "ETH",
        explorer_url: "https://basescan.org",
        icon_url: "/assets/chains/base.svg",
    },
    ChainDescriptor {
        id: "0xa86a",
        name: "Avalanche C-Chain",
        rpc_url: "https://api.avax.network/ext/bc/C/rpc",
        native_currency_symbol: "AVAX",
        explorer_url: "https://snowtrace.io",
        icon_url: "/assets/chains/avalanche.svg",
    },
];

/// Look up a chain by its hex id. Hex digits compare case-insensitively;
/// anything else (decimal strings, padded ids) is not found.
pub fn lookup(chain_id: &str) -> Option<&'static ChainDescriptor> {
    SUPPORTED_CHAINS
        .iter()
        .find(|chain| chain.id.eq_ignore_ascii_case(chain_id))
}

/// Look up a chain by numeric id.
pub fn lookup_numeric(chain_id: u64) -> Option<&'static ChainDescriptor> {
    SUPPORTED_CHAINS
        .iter()
        .find(|chain| chain.numeric_id() == chain_id)
}

/// Numeric ids of every registered chain, in registry order.
pub fn supported_numeric_ids() -> Vec<u64> {
    SUPPORTED_CHAINS.iter().map(ChainDescriptor::numeric_id).collect()
}

/// Parse a `0x`-prefixed hex chain id.
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let digits = chain_id
        .strip_prefix("0x")
        .or_else(|| chain_id.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Format a numeric chain id the way wallets report it (`137` -> `"0x89"`).
pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

/// Display name for a chain id, falling back to the raw id.
pub fn chain_name(chain_id: &str) -> String {
    lookup(chain_id)
        .map(|chain| chain.name.to_string())
        .unwrap_or_else(|| format!("Unknown network ({chain_id})"))
}
