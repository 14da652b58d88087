//! Security profiles: named bundles of spend, rate and slippage limits.
//!
//! Two base profiles exist, `balanced` and `autonomous`. Persisted overrides
//! are applied with [`SecurityProfile::with_overrides`], which returns a new
//! effective profile and leaves the base untouched.

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// One ETH in wei.
pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// One USDC in its smallest unit (6 decimals).
pub const USDC_UNIT: u64 = 1_000_000;

/// Named set of limits applied to every intent.
///
/// # Example
///
/// ```
/// use warden_policy::profile::{ProfileOverrides, SecurityProfile};
///
/// let base = SecurityProfile::balanced();
/// let overrides = ProfileOverrides {
///     max_slippage_bps: Some(50),
///     ..ProfileOverrides::default()
/// };
/// let effective = base.with_overrides(&overrides);
///
/// assert_eq!(effective.max_slippage_bps, 50);
/// assert_eq!(base.max_slippage_bps, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    /// Profile name.
    pub name: String,
    /// Largest native amount a single transaction may move (wei).
    pub per_tx_native_cap: u64,
    /// Largest native amount per UTC day (wei).
    pub daily_native_cap: u64,
    /// Largest stablecoin amount a single transaction may move.
    pub per_tx_stablecoin_cap: u64,
    /// Largest stablecoin amount per UTC day.
    pub daily_stablecoin_cap: u64,
    /// Maximum signed transactions in any trailing hour.
    pub max_tx_per_hour: u32,
    /// Minimum seconds between signed transactions.
    pub min_cooldown_secs: u64,
    /// Maximum tolerated swap slippage in basis points.
    pub max_slippage_bps: u32,
}

impl SecurityProfile {
    /// Name of the balanced profile.
    pub const BALANCED: &'static str = "balanced";
    /// Name of the autonomous profile.
    pub const AUTONOMOUS: &'static str = "autonomous";

    /// Conservative limits: 0.05 ETH per tx, 0.25 ETH per day, 100/500 USDC.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: Self::BALANCED.to_string(),
            per_tx_native_cap: 50_000_000_000_000_000,
            daily_native_cap: 250_000_000_000_000_000,
            per_tx_stablecoin_cap: 100_000_000,
            daily_stablecoin_cap: 500_000_000,
            max_tx_per_hour: 10,
            min_cooldown_secs: 30,
            max_slippage_bps: 100,
        }
    }

    /// Wider limits: 0.25 ETH per tx, 1 ETH per day, 500/2500 USDC.
    #[must_use]
    pub fn autonomous() -> Self {
        Self {
            name: Self::AUTONOMOUS.to_string(),
            per_tx_native_cap: 250_000_000_000_000_000,
            daily_native_cap: WEI_PER_ETH,
            per_tx_stablecoin_cap: 500_000_000,
            daily_stablecoin_cap: 2_500_000_000,
            max_tx_per_hour: 30,
            min_cooldown_secs: 10,
            max_slippage_bps: 200,
        }
    }

    /// Look up a base profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::UnknownProfile`] for anything but the two base names.
    pub fn for_name(name: &str) -> PolicyResult<Self> {
        match name {
            Self::BALANCED => Ok(Self::balanced()),
            Self::AUTONOMOUS => Ok(Self::autonomous()),
            other => Err(PolicyError::UnknownProfile {
                name: other.to_string(),
            }),
        }
    }

    /// Produce a new profile with every present override applied.
    #[must_use]
    pub fn with_overrides(&self, overrides: &ProfileOverrides) -> Self {
        Self {
            name: self.name.clone(),
            per_tx_native_cap: overrides.per_tx_native_cap.unwrap_or(self.per_tx_native_cap),
            daily_native_cap: overrides.daily_native_cap.unwrap_or(self.daily_native_cap),
            per_tx_stablecoin_cap: overrides
                .per_tx_stablecoin_cap
                .unwrap_or(self.per_tx_stablecoin_cap),
            daily_stablecoin_cap: overrides
                .daily_stablecoin_cap
                .unwrap_or(self.daily_stablecoin_cap),
            max_tx_per_hour: overrides.max_tx_per_hour.unwrap_or(self.max_tx_per_hour),
            min_cooldown_secs: overrides
                .min_cooldown_secs
                .unwrap_or(self.min_cooldown_secs),
            max_slippage_bps: overrides.max_slippage_bps.unwrap_or(self.max_slippage_bps),
        }
    }
}

impl Default for SecurityProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Per-field replacements for a base profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    /// Replacement per-transaction native cap (wei).
    pub per_tx_native_cap: Option<u64>,
    /// Replacement daily native cap (wei).
    pub daily_native_cap: Option<u64>,
    /// Replacement per-transaction stablecoin cap.
    pub per_tx_stablecoin_cap: Option<u64>,
    /// Replacement daily stablecoin cap.
    pub daily_stablecoin_cap: Option<u64>,
    /// Replacement hourly transaction limit.
    pub max_tx_per_hour: Option<u32>,
    /// Replacement cooldown in seconds.
    pub min_cooldown_secs: Option<u64>,
    /// Replacement slippage limit in basis points.
    pub max_slippage_bps: Option<u32>,
}

impl ProfileOverrides {
    /// Whether no field is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_limits() {
        let p = SecurityProfile::balanced();
        assert_eq!(p.per_tx_native_cap, WEI_PER_ETH / 20);
        assert_eq!(p.daily_native_cap, WEI_PER_ETH / 4);
        assert_eq!(p.per_tx_stablecoin_cap, 100 * USDC_UNIT);
        assert_eq!(p.daily_stablecoin_cap, 500 * USDC_UNIT);
        assert_eq!(p.max_slippage_bps, 100);
    }

    #[test]
    fn test_autonomous_is_wider_than_balanced() {
        let b = SecurityProfile::balanced();
        let a = SecurityProfile::autonomous();
        assert!(a.per_tx_native_cap > b.per_tx_native_cap);
        assert!(a.daily_native_cap > b.daily_native_cap);
        assert!(a.max_tx_per_hour > b.max_tx_per_hour);
        assert!(a.min_cooldown_secs < b.min_cooldown_secs);
    }

    #[test]
    fn test_for_name() {
        assert_eq!(
            SecurityProfile::for_name("autonomous").unwrap(),
            SecurityProfile::autonomous()
        );
        let err = SecurityProfile::for_name("reckless").unwrap_err();
        assert!(err.to_string().contains("reckless"));
    }

    #[test]
    fn test_overrides_are_pure() {
        let base = SecurityProfile::balanced();
        let overrides = ProfileOverrides {
            per_tx_native_cap: Some(1),
            max_tx_per_hour: Some(2),
            ..ProfileOverrides::default()
        };
        let effective = base.with_overrides(&overrides);

        assert_eq!(effective.per_tx_native_cap, 1);
        assert_eq!(effective.max_tx_per_hour, 2);
        assert_eq!(effective.daily_native_cap, base.daily_native_cap);
        assert_eq!(effective.name, "balanced");
        assert_eq!(base, SecurityProfile::balanced());
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let overrides = ProfileOverrides::default();
        assert!(overrides.is_empty());
        let base = SecurityProfile::autonomous();
        assert_eq!(base.with_overrides(&overrides), base);
    }
}
