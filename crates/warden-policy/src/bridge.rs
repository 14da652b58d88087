//! Conversion from [`WardenConfig`] into policy types.
//!
//! `warden-config` keeps addresses as strings and limits as plain integers;
//! this module parses and cross-checks them. The policy core itself never
//! reads files.

use std::time::Duration;

use warden_config::{ApprovalSection, PolicySection, WardenConfig};
use warden_crypto::Address;

use crate::approval::{ApprovalLimits, ApprovalManager};
use crate::engine::PolicyEngine;
use crate::error::{PolicyError, PolicyResult};
use crate::profile::{ProfileOverrides, SecurityProfile};

/// Everything the policy core needs from configuration, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy {
    /// Base profile with overrides applied.
    pub profile: SecurityProfile,
    /// Approval code limits.
    pub approval_limits: ApprovalLimits,
    /// Allowlisted addresses.
    pub allowlist: Vec<Address>,
    /// Smart account, if configured.
    pub wallet: Option<Address>,
    /// Chain the wallet lives on.
    pub home_chain_id: u64,
    /// `EntryPoint` used for transaction hashes.
    pub entry_point: Address,
    /// Start frozen.
    pub frozen: bool,
    /// Quote timeout.
    pub quote_timeout: Duration,
}

impl EffectivePolicy {
    /// Parse and cross-check a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for an unknown profile, an unparseable address
    /// or a per-transaction cap above its daily cap after overrides.
    pub fn from_config(config: &WardenConfig) -> PolicyResult<Self> {
        let allowlist = config
            .wallet
            .allowlist
            .iter()
            .enumerate()
            .map(|(i, s)| parse_address(&format!("wallet.allowlist[{i}]"), s))
            .collect::<PolicyResult<Vec<_>>>()?;

        let wallet = config
            .wallet
            .address
            .as_deref()
            .map(|s| parse_address("wallet.address", s))
            .transpose()?;

        Ok(Self {
            profile: profile_from_config(&config.policy)?,
            approval_limits: approval_limits_from_config(&config.approval),
            allowlist,
            wallet,
            home_chain_id: config.wallet.home_chain_id,
            entry_point: parse_address("wallet.entry_point", &config.wallet.entry_point)?,
            frozen: config.wallet.frozen,
            quote_timeout: Duration::from_millis(config.quote.timeout_ms),
        })
    }
}

/// Overrides set in `[policy]`.
#[must_use]
pub fn overrides_from_config(section: &PolicySection) -> ProfileOverrides {
    ProfileOverrides {
        per_tx_native_cap: section.per_tx_eth_cap,
        daily_native_cap: section.daily_eth_cap,
        per_tx_stablecoin_cap: section.per_tx_stablecoin_cap,
        daily_stablecoin_cap: section.daily_stablecoin_cap,
        max_tx_per_hour: section.max_tx_per_hour,
        min_cooldown_secs: section.min_cooldown_secs,
        max_slippage_bps: section.max_slippage_bps,
    }
}

/// The effective profile for `[policy]`.
///
/// # Errors
///
/// Returns [`PolicyError::UnknownProfile`] for an unknown base name and
/// [`PolicyError::Config`] when an override leaves a per-transaction cap
/// above the matching daily cap.
pub fn profile_from_config(section: &PolicySection) -> PolicyResult<SecurityProfile> {
    let base = SecurityProfile::for_name(&section.profile)?;
    let profile = base.with_overrides(&overrides_from_config(section));

    if profile.per_tx_native_cap > profile.daily_native_cap {
        return Err(PolicyError::Config(format!(
            "per-tx ETH cap {} exceeds daily ETH cap {}",
            profile.per_tx_native_cap, profile.daily_native_cap
        )));
    }
    if profile.per_tx_stablecoin_cap > profile.daily_stablecoin_cap {
        return Err(PolicyError::Config(format!(
            "per-tx stablecoin cap {} exceeds daily stablecoin cap {}",
            profile.per_tx_stablecoin_cap, profile.daily_stablecoin_cap
        )));
    }
    Ok(profile)
}

/// Approval limits for `[approval]`.
#[must_use]
pub fn approval_limits_from_config(section: &ApprovalSection) -> ApprovalLimits {
    ApprovalLimits::default()
        .with_expiry_secs(section.expiry_secs)
        .with_max_failed_per_code(section.max_failed_per_code)
        .with_max_global_failures(
            usize::try_from(section.max_global_failures_per_minute).unwrap_or(usize::MAX),
        )
}

fn parse_address(field: &str, value: &str) -> PolicyResult<Address> {
    Address::parse(value).map_err(|source| PolicyError::InvalidAddress {
        field: field.to_string(),
        source,
    })
}

impl PolicyEngine {
    /// Build an engine from configuration.
    ///
    /// The quote source is not configurable here; attach one with
    /// [`with_quote_source`](Self::with_quote_source).
    ///
    /// # Errors
    ///
    /// See [`EffectivePolicy::from_config`].
    pub fn from_config(config: &WardenConfig) -> PolicyResult<Self> {
        let effective = EffectivePolicy::from_config(config)?;
        tracing::info!(
            profile = %effective.profile.name,
            allowlist = effective.allowlist.len(),
            frozen = effective.frozen,
            wallet = ?effective.wallet,
            home_chain_id = effective.home_chain_id,
            "Policy engine configured"
        );
        let mut engine = Self::new(effective.profile)
            .with_allowlist(effective.allowlist)
            .with_frozen(effective.frozen)
            .with_quote_timeout(effective.quote_timeout)
            .with_home_chain_id(effective.home_chain_id);
        if let Some(wallet) = effective.wallet {
            engine = engine.with_wallet(wallet);
        }
        Ok(engine)
    }
}

impl ApprovalManager {
    /// Build a manager with the limits in `[approval]`.
    #[must_use]
    pub fn from_config(config: &WardenConfig) -> Self {
        Self::with_limits(approval_limits_from_config(&config.approval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::WEI_PER_ETH;

    const ALLOWED: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_default_config() {
        let effective = EffectivePolicy::from_config(&WardenConfig::default()).unwrap();
        assert_eq!(effective.profile, SecurityProfile::balanced());
        assert_eq!(effective.approval_limits, ApprovalLimits::default());
        assert_eq!(effective.home_chain_id, 8453);
        assert_eq!(effective.entry_point, warden_crypto::DEFAULT_ENTRY_POINT);
        assert_eq!(effective.quote_timeout, Duration::from_secs(5));
        assert!(effective.wallet.is_none());
        assert!(!effective.frozen);
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = WardenConfig::default();
        config.policy.profile = "autonomous".to_owned();
        config.policy.max_slippage_bps = Some(50);
        config.policy.per_tx_eth_cap = Some(WEI_PER_ETH / 10);

        let profile = profile_from_config(&config.policy).unwrap();
        assert_eq!(profile.name, "autonomous");
        assert_eq!(profile.max_slippage_bps, 50);
        assert_eq!(profile.per_tx_native_cap, WEI_PER_ETH / 10);
        assert_eq!(profile.daily_native_cap, WEI_PER_ETH);
    }

    #[test]
    fn test_override_above_base_daily_cap_rejected() {
        let mut config = WardenConfig::default();
        // Balanced daily cap is 0.25 ETH.
        config.policy.per_tx_eth_cap = Some(WEI_PER_ETH);
        assert!(matches!(
            profile_from_config(&config.policy),
            Err(PolicyError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = WardenConfig::default();
        config.policy.profile = "reckless".to_owned();
        assert!(matches!(
            EffectivePolicy::from_config(&config),
            Err(PolicyError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_bad_allowlist_names_field() {
        let mut config = WardenConfig::default();
        config.wallet.allowlist = vec![ALLOWED.to_owned(), "0xnope".to_owned()];
        let err = EffectivePolicy::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("wallet.allowlist[1]"));
    }

    #[test]
    fn test_engine_from_config() {
        let mut config = WardenConfig::default();
        config.wallet.allowlist = vec![ALLOWED.to_uppercase().replace("0X", "0x")];
        config.wallet.frozen = true;
        config.quote.timeout_ms = 250;

        let engine = PolicyEngine::from_config(&config).unwrap();
        assert!(engine.is_frozen());
        assert!(engine.is_allowlisted(&Address::parse(ALLOWED).unwrap()));
        assert_eq!(engine.quote_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_engine_binds_configured_wallet() {
        let engine = PolicyEngine::from_config(&WardenConfig::default()).unwrap();
        assert_eq!(engine.wallet(), None);
        assert_eq!(engine.home_chain_id(), Some(8453));

        let mut config = WardenConfig::default();
        config.wallet.address = Some(ALLOWED.to_owned());
        config.wallet.home_chain_id = 1;
        let engine = PolicyEngine::from_config(&config).unwrap();
        assert_eq!(engine.wallet(), Some(Address::parse(ALLOWED).unwrap()));
        assert_eq!(engine.home_chain_id(), Some(1));
    }

    #[test]
    fn test_approval_limits_from_config() {
        let mut config = WardenConfig::default();
        config.approval.expiry_secs = 60;
        config.approval.max_global_failures_per_minute = 10;
        let manager = ApprovalManager::from_config(&config);
        assert_eq!(manager.limits().expiry, chrono::Duration::seconds(60));
        assert_eq!(manager.limits().max_global_failures, 10);
        assert_eq!(manager.limits().max_failed_per_code, 3);
    }
}
