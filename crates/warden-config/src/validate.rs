//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::WardenConfig;

/// Known profile names.
pub const PROFILES: [&str; 2] = ["balanced", "autonomous"];

const MAX_SLIPPAGE_BPS: u32 = 10_000;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &WardenConfig) -> ConfigResult<()> {
    validate_policy(config)?;
    validate_wallet(config)?;
    validate_approval(config)?;
    validate_quote(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Whether `s` is a 20-byte hex address with an optional `0x` prefix.
#[must_use]
pub fn is_hex_address(s: &str) -> bool {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn validate_policy(config: &WardenConfig) -> ConfigResult<()> {
    let p = &config.policy;

    if !PROFILES.contains(&p.profile.as_str()) {
        return Err(ConfigError::invalid(
            "policy.profile",
            format!(
                "unknown profile '{}'; expected one of: {}",
                p.profile,
                PROFILES.join(", ")
            ),
        ));
    }

    for (field, value) in [
        ("policy.per_tx_eth_cap", p.per_tx_eth_cap),
        ("policy.daily_eth_cap", p.daily_eth_cap),
        ("policy.per_tx_stablecoin_cap", p.per_tx_stablecoin_cap),
        ("policy.daily_stablecoin_cap", p.daily_stablecoin_cap),
        ("policy.max_tx_per_hour", p.max_tx_per_hour.map(u64::from)),
    ] {
        if value == Some(0) {
            return Err(ConfigError::invalid(field, "must be greater than zero"));
        }
    }

    if let (Some(per_tx), Some(daily)) = (p.per_tx_eth_cap, p.daily_eth_cap)
        && per_tx > daily
    {
        return Err(ConfigError::invalid(
            "policy.per_tx_eth_cap",
            format!("per_tx_eth_cap ({per_tx}) must not exceed daily_eth_cap ({daily})"),
        ));
    }

    if let (Some(per_tx), Some(daily)) = (p.per_tx_stablecoin_cap, p.daily_stablecoin_cap)
        && per_tx > daily
    {
        return Err(ConfigError::invalid(
            "policy.per_tx_stablecoin_cap",
            format!(
                "per_tx_stablecoin_cap ({per_tx}) must not exceed daily_stablecoin_cap ({daily})"
            ),
        ));
    }

    if let Some(bps) = p.max_slippage_bps
        && bps > MAX_SLIPPAGE_BPS
    {
        return Err(ConfigError::invalid(
            "policy.max_slippage_bps",
            format!("{bps} is out of range; must be 0-{MAX_SLIPPAGE_BPS}"),
        ));
    }

    Ok(())
}

fn validate_wallet(config: &WardenConfig) -> ConfigResult<()> {
    let w = &config.wallet;

    if let Some(address) = &w.address
        && !is_hex_address(address)
    {
        return Err(ConfigError::invalid(
            "wallet.address",
            format!("'{address}' is not a 20-byte hex address"),
        ));
    }

    if w.home_chain_id == 0 {
        return Err(ConfigError::invalid(
            "wallet.home_chain_id",
            "chain id must be greater than zero",
        ));
    }

    if let Some((i, bad)) = w
        .allowlist
        .iter()
        .enumerate()
        .find(|(_, a)| !is_hex_address(a))
    {
        return Err(ConfigError::invalid(
            format!("wallet.allowlist[{i}]"),
            format!("'{bad}' is not a 20-byte hex address"),
        ));
    }

    if !is_hex_address(&w.entry_point) {
        return Err(ConfigError::invalid(
            "wallet.entry_point",
            format!("'{}' is not a 20-byte hex address", w.entry_point),
        ));
    }

    Ok(())
}

fn validate_approval(config: &WardenConfig) -> ConfigResult<()> {
    let a = &config.approval;

    if a.expiry_secs == 0 {
        return Err(ConfigError::invalid(
            "approval.expiry_secs",
            "expiry must be greater than zero",
        ));
    }
    if a.max_failed_per_code == 0 {
        return Err(ConfigError::invalid(
            "approval.max_failed_per_code",
            "must be greater than zero",
        ));
    }
    if a.max_global_failures_per_minute == 0 {
        return Err(ConfigError::invalid(
            "approval.max_global_failures_per_minute",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_quote(config: &WardenConfig) -> ConfigResult<()> {
    if config.quote.timeout_ms == 0 {
        return Err(ConfigError::invalid(
            "quote.timeout_ms",
            "timeout must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_logging(config: &WardenConfig) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&WardenConfig::default()).is_ok());
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = WardenConfig::default();
        config.policy.profile = "yolo".to_owned();
        assert_eq!(field_of(validate(&config)), "policy.profile");
    }

    #[test]
    fn test_zero_cap_rejected() {
        let mut config = WardenConfig::default();
        config.policy.daily_stablecoin_cap = Some(0);
        assert_eq!(field_of(validate(&config)), "policy.daily_stablecoin_cap");
    }

    #[test]
    fn test_per_tx_above_daily_rejected() {
        let mut config = WardenConfig::default();
        config.policy.per_tx_eth_cap = Some(10);
        config.policy.daily_eth_cap = Some(5);
        assert_eq!(field_of(validate(&config)), "policy.per_tx_eth_cap");
    }

    #[test]
    fn test_slippage_bound() {
        let mut config = WardenConfig::default();
        config.policy.max_slippage_bps = Some(10_000);
        assert!(validate(&config).is_ok());
        config.policy.max_slippage_bps = Some(10_001);
        assert_eq!(field_of(validate(&config)), "policy.max_slippage_bps");
    }

    #[test]
    fn test_bad_allowlist_entry_is_indexed() {
        let mut config = WardenConfig::default();
        config.wallet.allowlist = vec![
            "0x2222222222222222222222222222222222222222".to_owned(),
            "0x1234".to_owned(),
        ];
        assert_eq!(field_of(validate(&config)), "wallet.allowlist[1]");
    }

    #[test]
    fn test_bad_wallet_address() {
        let mut config = WardenConfig::default();
        config.wallet.address = Some("not-an-address".to_owned());
        assert_eq!(field_of(validate(&config)), "wallet.address");
    }

    #[test]
    fn test_zero_expiry_and_timeout() {
        let mut config = WardenConfig::default();
        config.approval.expiry_secs = 0;
        assert_eq!(field_of(validate(&config)), "approval.expiry_secs");

        let mut config = WardenConfig::default();
        config.quote.timeout_ms = 0;
        assert_eq!(field_of(validate(&config)), "quote.timeout_ms");
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = WardenConfig::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }

    #[test]
    fn test_is_hex_address() {
        assert!(is_hex_address("0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108"));
        assert!(is_hex_address("4337084d9e255ff0702461cf8895ce9e3b5ff108"));
        assert!(!is_hex_address("0x4337084d9e255ff0702461cf8895ce9e3b5ff10"));
        assert!(!is_hex_address("0xZZ37084d9e255ff0702461cf8895ce9e3b5ff108"));
    }
}
