//! UI Components

pub mod navbar;
pub mod wallet_connect;

pub use navbar::Navbar;
pub use wallet_connect::WalletConnect;
