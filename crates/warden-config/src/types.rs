//! Configuration types for the warden daemon.
//!
//! Types here have no dependency on other warden crates. Addresses are kept
//! as strings and profile limits as plain integers; conversion into domain
//! types happens in `warden-policy`'s bridge. Every struct implements
//! [`Default`] so a bare `[section]` header yields a working configuration.

use serde::{Deserialize, Serialize};

/// ERC-4337 v0.8 `EntryPoint`.
pub const DEFAULT_ENTRY_POINT: &str = "0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108";

/// Base mainnet.
pub const DEFAULT_HOME_CHAIN_ID: u64 = 8453;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Active security profile and per-field overrides.
    pub policy: PolicySection,
    /// Wallet identity, allowlist and freeze state.
    pub wallet: WalletSection,
    /// Approval code limits.
    pub approval: ApprovalSection,
    /// Market quote settings.
    pub quote: QuoteSection,
    /// Logging level, format and directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// PolicySection
// ---------------------------------------------------------------------------

/// Security profile selection.
///
/// Unset overrides inherit the base profile's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// `"balanced"` or `"autonomous"`.
    pub profile: String,
    /// Per-transaction ETH cap in wei.
    pub per_tx_eth_cap: Option<u64>,
    /// Daily ETH cap in wei.
    pub daily_eth_cap: Option<u64>,
    /// Per-transaction stablecoin cap in base units.
    pub per_tx_stablecoin_cap: Option<u64>,
    /// Daily stablecoin cap in base units.
    pub daily_stablecoin_cap: Option<u64>,
    /// Transactions allowed per trailing hour.
    pub max_tx_per_hour: Option<u32>,
    /// Minimum seconds between transactions.
    pub min_cooldown_secs: Option<u64>,
    /// Maximum swap slippage in basis points.
    pub max_slippage_bps: Option<u32>,
}

impl PolicySection {
    /// Whether any override is set.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        self.per_tx_eth_cap.is_some()
            || self.daily_eth_cap.is_some()
            || self.per_tx_stablecoin_cap.is_some()
            || self.daily_stablecoin_cap.is_some()
            || self.max_tx_per_hour.is_some()
            || self.min_cooldown_secs.is_some()
            || self.max_slippage_bps.is_some()
    }
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            profile: "balanced".to_owned(),
            per_tx_eth_cap: None,
            daily_eth_cap: None,
            per_tx_stablecoin_cap: None,
            daily_stablecoin_cap: None,
            max_tx_per_hour: None,
            min_cooldown_secs: None,
            max_slippage_bps: None,
        }
    }
}

// ---------------------------------------------------------------------------
// WalletSection
// ---------------------------------------------------------------------------

/// The smart account this daemon signs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSection {
    /// Smart account address, once deployed.
    pub address: Option<String>,
    /// Chain the wallet lives on.
    pub home_chain_id: u64,
    /// Start with signing blocked.
    pub frozen: bool,
    /// Addresses eligible for transfers without approval.
    pub allowlist: Vec<String>,
    /// `EntryPoint` contract used for the transaction hash domain.
    pub entry_point: String,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            address: None,
            home_chain_id: DEFAULT_HOME_CHAIN_ID,
            frozen: false,
            allowlist: Vec::new(),
            entry_point: DEFAULT_ENTRY_POINT.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Approval code limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Code lifetime.
    pub expiry_secs: u32,
    /// Failed attempts before a code is revoked.
    pub max_failed_per_code: u32,
    /// Failed verifications per minute before rate limiting.
    pub max_global_failures_per_minute: u32,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            expiry_secs: 180,
            max_failed_per_code: 3,
            max_global_failures_per_minute: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// QuoteSection
// ---------------------------------------------------------------------------

/// Market quote settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSection {
    /// Time allowed for a quote before failing closed.
    pub timeout_ms: u64,
}

impl Default for QuoteSection {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Per-crate directives, e.g. `["warden_policy=debug"]`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
