//! Stablecoin and protocol registries.
//!
//! The decoder and the engine only query these; they never mutate them.
//! Built-in registries cover Ethereum mainnet and Base.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use warden_crypto::Address;

use crate::profile::SecurityProfile;
use crate::selector::{
    AAVE_SUPPLY, AAVE_WITHDRAW, ROUTER_EXECUTE, Selector, WETH_DEPOSIT, WETH_WITHDRAW,
};

/// Ethereum mainnet chain id.
pub const MAINNET: u64 = 1;

/// Base chain id.
pub const BASE: u64 = 8453;

/// USDC on Ethereum mainnet.
pub const USDC_MAINNET: Address = Address::from_bytes([
    0xa0, 0xb8, 0x69, 0x91, 0xc6, 0x21, 0x8b, 0x36, 0xc1, 0xd1, 0x9d, 0x4a, 0x2e, 0x9e, 0xb0, 0xce,
    0x36, 0x06, 0xeb, 0x48,
]);

/// USDC on Base.
pub const USDC_BASE: Address = Address::from_bytes([
    0x83, 0x35, 0x89, 0xfc, 0xd6, 0xed, 0xb6, 0xe0, 0x8f, 0x4c, 0x7c, 0x32, 0xd4, 0xf7, 0x1b, 0x54,
    0xbd, 0xa0, 0x29, 0x13,
]);

/// Uniswap Universal Router (same address on mainnet and Base).
pub const UNIVERSAL_ROUTER: Address = Address::from_bytes([
    0x3f, 0xc9, 0x1a, 0x3a, 0xfd, 0x70, 0x39, 0x5c, 0xd4, 0x96, 0xc6, 0x47, 0xd5, 0xa6, 0xcc, 0x9d,
    0x4b, 0x2b, 0x7f, 0xad,
]);

/// WETH on Ethereum mainnet.
pub const WETH_MAINNET: Address = Address::from_bytes([
    0xc0, 0x2a, 0xaa, 0x39, 0xb2, 0x23, 0xfe, 0x8d, 0x0a, 0x0e, 0x5c, 0x4f, 0x27, 0xea, 0xd9, 0x08,
    0x3c, 0x75, 0x6c, 0xc2,
]);

/// WETH on Base.
pub const WETH_BASE: Address = Address::from_bytes([
    0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x06,
]);

/// Aave v3 Pool on Ethereum mainnet.
pub const AAVE_POOL_MAINNET: Address = Address::from_bytes([
    0x87, 0x87, 0x0b, 0xca, 0x3f, 0x3f, 0xd6, 0x33, 0x5c, 0x3f, 0x4c, 0xe8, 0x39, 0x2d, 0x69, 0x35,
    0x0b, 0x4f, 0xa4, 0xe2,
]);

/// Aave v3 Pool on Base.
pub const AAVE_POOL_BASE: Address = Address::from_bytes([
    0xa2, 0x38, 0xdd, 0x80, 0xc2, 0x59, 0xa7, 0x2e, 0x81, 0xd7, 0xe4, 0x66, 0x4a, 0x98, 0x01, 0x59,
    0x3f, 0x98, 0xd1, 0xc5,
]);

/// Answers whether a token contract is a recognized stablecoin.
pub trait StablecoinRegistry: Send + Sync {
    /// Whether `address` is a registered stablecoin on `chain_id`.
    fn is_stablecoin(&self, chain_id: u64, address: &Address) -> bool;
}

/// A registered protocol entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMethod {
    /// Protocol name, e.g. `Uniswap`.
    pub protocol: String,
    /// Method name, e.g. `execute`.
    pub method: String,
}

/// Answers whether a (chain, contract, selector) triple is an allowed protocol call.
pub trait ProtocolRegistry: Send + Sync {
    /// Describe the registered method, if any.
    fn lookup(&self, chain_id: u64, target: &Address, selector: Selector) -> Option<ProtocolMethod>;

    /// Whether the call is allowed.
    fn is_allowed(&self, chain_id: u64, target: &Address, selector: Selector) -> bool {
        self.lookup(chain_id, target, selector).is_some()
    }
}

/// Built-in stablecoin registry (USDC on mainnet and Base).
#[derive(Debug, Clone)]
pub struct KnownStablecoins {
    entries: HashSet<(u64, Address)>,
}

impl KnownStablecoins {
    /// A registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashSet::new(),
        }
    }

    /// Register an additional stablecoin.
    #[must_use]
    pub fn with(mut self, chain_id: u64, address: Address) -> Self {
        self.entries.insert((chain_id, address));
        self
    }
}

impl Default for KnownStablecoins {
    fn default() -> Self {
        Self::empty()
            .with(MAINNET, USDC_MAINNET)
            .with(BASE, USDC_BASE)
    }
}

impl StablecoinRegistry for KnownStablecoins {
    fn is_stablecoin(&self, chain_id: u64, address: &Address) -> bool {
        self.entries.contains(&(chain_id, *address))
    }
}

/// Built-in protocol registry.
#[derive(Debug, Clone)]
pub struct KnownProtocols {
    entries: HashMap<(u64, Address, Selector), ProtocolMethod>,
}

impl KnownProtocols {
    /// A registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry for a profile.
    ///
    /// Every profile gets the Universal Router and WETH wrapping. The
    /// autonomous profile also gets Aave v3 supply and withdraw.
    #[must_use]
    pub fn for_profile(profile_name: &str) -> Self {
        let mut registry = Self::empty();
        for (chain, weth) in [(MAINNET, WETH_MAINNET), (BASE, WETH_BASE)] {
            registry = registry
                .with(chain, UNIVERSAL_ROUTER, ROUTER_EXECUTE, "Uniswap", "execute")
                .with(chain, weth, WETH_DEPOSIT, "WETH", "deposit")
                .with(chain, weth, WETH_WITHDRAW, "WETH", "withdraw");
        }
        if profile_name == SecurityProfile::AUTONOMOUS {
            for (chain, pool) in [(MAINNET, AAVE_POOL_MAINNET), (BASE, AAVE_POOL_BASE)] {
                registry = registry
                    .with(chain, pool, AAVE_SUPPLY, "Aave v3", "supply")
                    .with(chain, pool, AAVE_WITHDRAW, "Aave v3", "withdraw");
            }
        }
        registry
    }

    /// Register a protocol method.
    #[must_use]
    pub fn with(
        mut self,
        chain_id: u64,
        target: Address,
        selector: Selector,
        protocol: &str,
        method: &str,
    ) -> Self {
        self.entries.insert(
            (chain_id, target, selector),
            ProtocolMethod {
                protocol: protocol.to_string(),
                method: method.to_string(),
            },
        );
        self
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProtocolRegistry for KnownProtocols {
    fn lookup(&self, chain_id: u64, target: &Address, selector: Selector) -> Option<ProtocolMethod> {
        self.entries.get(&(chain_id, *target, selector)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_stablecoins() {
        let reg = KnownStablecoins::default();
        assert!(reg.is_stablecoin(BASE, &USDC_BASE));
        assert!(reg.is_stablecoin(MAINNET, &USDC_MAINNET));
        // Right token, wrong chain.
        assert!(!reg.is_stablecoin(BASE, &USDC_MAINNET));
        assert!(!reg.is_stablecoin(BASE, &WETH_BASE));
    }

    #[test]
    fn test_address_constants_parse_from_checksummed_text() {
        assert_eq!(
            Address::parse("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap(),
            USDC_BASE
        );
        assert_eq!(
            Address::parse("0x3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD").unwrap(),
            UNIVERSAL_ROUTER
        );
        assert_eq!(
            Address::parse("0xA238Dd80C259a72e81d7e4664a9801593F98d1c5").unwrap(),
            AAVE_POOL_BASE
        );
    }

    #[test]
    fn test_balanced_protocols() {
        let reg = KnownProtocols::for_profile("balanced");
        assert!(reg.is_allowed(BASE, &UNIVERSAL_ROUTER, ROUTER_EXECUTE));
        assert!(reg.is_allowed(MAINNET, &WETH_MAINNET, WETH_DEPOSIT));
        assert!(!reg.is_allowed(BASE, &AAVE_POOL_BASE, AAVE_SUPPLY));
        assert_eq!(reg.len(), 6);
    }

    #[test]
    fn test_autonomous_adds_aave() {
        let reg = KnownProtocols::for_profile("autonomous");
        let method = reg.lookup(BASE, &AAVE_POOL_BASE, AAVE_SUPPLY).unwrap();
        assert_eq!(method.protocol, "Aave v3");
        assert_eq!(method.method, "supply");
        assert_eq!(reg.len(), 10);
    }

    #[test]
    fn test_selector_must_match() {
        let reg = KnownProtocols::for_profile("balanced");
        assert!(!reg.is_allowed(BASE, &UNIVERSAL_ROUTER, WETH_DEPOSIT));
    }
}
