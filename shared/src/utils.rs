//! # Shared Utility Functions
//!
//! Common utility functions used by the wallet core and the web widget.
//!
//! ## Address Formatting
//!
//! Functions for formatting EVM wallet addresses for display:
//! - [`format_address`] - Format address with ellipsis (first N and last M characters)
//! - [`truncate_address`] - `format_address` with the widget's default lengths
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::format_address;
//!
//! let address = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
//! let formatted = format_address(address, 6, 4);
//! assert_eq!(formatted, "0x71C7...976F");
//! ```

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
/// assert_eq!(format_address(addr, 6, 4), "0x71C7...976F");
/// assert_eq!(format_address(addr, 4, 4), "0x71...976F");
/// assert_eq!(format_address("0xabc", 6, 4), "0xabc");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    // Also guards against individual lengths exceeding the address length
    if address_len <= prefix_len + suffix_len
        || prefix_len >= address_len
        || suffix_len >= address_len
        || !address.is_ascii()
    {
        return address.to_string();
    }

    let prefix = &address[..prefix_len];
    let suffix = &address[address_len - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Format an address with the widget's default `0x1234...abcd` shape.
///
/// ```rust
/// use shared::utils::truncate_address;
///
/// let addr = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
/// assert_eq!(truncate_address(addr), "0x71C7...976F");
/// ```
pub fn truncate_address(address: &str) -> String {
    format_address(address, 6, 4)
}
