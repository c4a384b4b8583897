//! # Widget Configuration
//!
//! Settings for the wallet-connection widget. A wasm bundle has no process
//! environment at runtime, so overrides are read from the *build* environment
//! with `option_env!` and fall back to defaults.
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance:
//!
//! ```rust
//! use lib_core::config::core_config;
//!
//! let config = core_config();
//! assert_eq!(config.primary_chain_id, 1);
//! ```
//!
//! Call [`init_config()`] once at start-up, before anything reads
//! `core_config()`. The first `core_config()` call latches whatever is
//! installed at that moment; if that is the defaults, a later
//! `init_config()` cannot replace them and reports so.

use std::sync::OnceLock;

use shared::chains;

/// Project identifier registered with the WalletConnect cloud.
pub const DEFAULT_PROJECT_ID: &str = "3fcc6bba6f1de962d911bb5b5c3dba68";
/// Wait budget for the remote pairing flow.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 30_000;
/// Settle delay between tearing down one provider and connecting the next.
pub const DEFAULT_SWITCH_GRACE_MS: u32 = 500;

/// Widget configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// WalletConnect cloud project id
    pub walletconnect_project_id: String,

    /// Required chain of every pairing session (Ethereum mainnet)
    pub primary_chain_id: u64,

    /// How long `connect()` on the pairing session waits for accounts
    pub connect_timeout_ms: u32,

    /// Delay after tearing down the previous provider before a new connect
    pub switch_grace_ms: u32,

    /// dApp metadata shown in the wallet during pairing
    pub app_name: String,
    pub app_description: String,
    pub app_url: String,
    pub app_icon: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            walletconnect_project_id: DEFAULT_PROJECT_ID.to_string(),
            primary_chain_id: 1,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            switch_grace_ms: DEFAULT_SWITCH_GRACE_MS,
            app_name: "XForce Wallet".to_string(),
            app_description: "Connect your wallet".to_string(),
            app_url: "https://xforce.app".to_string(),
            app_icon: "https://xforce.app/assets/icon.png".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from compile-time environment overrides.
    pub fn from_build_env() -> Result<Self, String> {
        Self::from_lookup(|name| match name {
            "WALLETCONNECT_PROJECT_ID" => option_env!("WALLETCONNECT_PROJECT_ID"),
            "WALLET_CONNECT_TIMEOUT_MS" => option_env!("WALLET_CONNECT_TIMEOUT_MS"),
            "WALLET_SWITCH_GRACE_MS" => option_env!("WALLET_SWITCH_GRACE_MS"),
            "WALLET_APP_NAME" => option_env!("WALLET_APP_NAME"),
            "WALLET_APP_URL" => option_env!("WALLET_APP_URL"),
            _ => None,
        })
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Result<Self, String> {
        let defaults = Self::default();

        let walletconnect_project_id = lookup("WALLETCONNECT_PROJECT_ID")
            .map(str::to_string)
            .unwrap_or(defaults.walletconnect_project_id);

        let connect_timeout_ms = match lookup("WALLET_CONNECT_TIMEOUT_MS") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("WALLET_CONNECT_TIMEOUT_MS must be a valid number: {}", e))?,
            None => defaults.connect_timeout_ms,
        };

        let switch_grace_ms = match lookup("WALLET_SWITCH_GRACE_MS") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("WALLET_SWITCH_GRACE_MS must be a valid number: {}", e))?,
            None => defaults.switch_grace_ms,
        };

        Ok(Self {
            walletconnect_project_id,
            connect_timeout_ms,
            switch_grace_ms,
            app_name: lookup("WALLET_APP_NAME")
                .map(str::to_string)
                .unwrap_or(defaults.app_name),
            app_url: lookup("WALLET_APP_URL")
                .map(str::to_string)
                .unwrap_or(defaults.app_url),
            ..defaults
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.walletconnect_project_id.trim().is_empty() {
            return Err("WALLETCONNECT_PROJECT_ID must not be empty".to_string());
        }

        if self.connect_timeout_ms == 0 {
            return Err("WALLET_CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if chains::lookup_numeric(self.primary_chain_id).is_none() {
            return Err(format!(
                "Primary chain {} is not in the chain registry",
                self.primary_chain_id
            ));
        }

        Ok(())
    }
}

/// Where the installed configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    Defaults,
    BuildEnv,
}

#[derive(Debug)]
struct Installed {
    config: Config,
    source: ConfigSource,
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Installed> = OnceLock::new();

/// Initialize the global configuration from the build environment.
///
/// Must run before the first [`core_config()`] call.
///
/// # Errors
///
/// Returns an error if an override is malformed, validation fails, or the
/// config has already been installed (including defaults latched by an
/// earlier `core_config()`).
pub fn init_config() -> Result<(), String> {
    let config = Config::from_build_env()?;
    config.validate()?;
    install(&CONFIG, config)
}

/// Get a reference to the global configuration. Latches the defaults if
/// [`init_config()`] has not run yet.
pub fn core_config() -> &'static Config {
    installed_or_defaults(&CONFIG)
}

fn install(cell: &OnceLock<Installed>, config: Config) -> Result<(), String> {
    let installed = Installed {
        config,
        source: ConfigSource::BuildEnv,
    };
    if cell.set(installed).is_ok() {
        return Ok(());
    }
    match cell.get().map(|installed| installed.source) {
        Some(ConfigSource::Defaults) => Err(
            "Config defaults were latched by core_config() before init_config(); overrides ignored"
                .to_string(),
        ),
        _ => Err("Config has already been initialized".to_string()),
    }
}

fn installed_or_defaults(cell: &OnceLock<Installed>) -> &Config {
    &cell
        .get_or_init(|| Installed {
            config: Config::default(),
            source: ConfigSource::Defaults,
        })
        .config
}
