//! Four-byte function selectors and the ones the core recognizes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 4-byte function selector: the first four bytes of calldata.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Extract the selector from calldata, if at least four bytes are present.
    #[must_use]
    pub fn from_calldata(calldata: &[u8]) -> Option<Self> {
        let head: [u8; 4] = calldata.get(..4)?.try_into().ok()?;
        Some(Self(head))
    }

    /// Compute the selector of a canonical function signature.
    #[must_use]
    pub fn of_signature(signature: &str) -> Self {
        Self(warden_crypto::ContentHash::hash(signature.as_bytes()).selector())
    }

    /// Lowercase hex without prefix, e.g. `a9059cbb`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector(0x{})", self.to_hex())
    }
}

/// `transfer(address,uint256)`
pub const ERC20_TRANSFER: Selector = Selector([0xa9, 0x05, 0x9c, 0xbb]);

/// Universal Router `execute(bytes,bytes[],uint256)`
pub const ROUTER_EXECUTE: Selector = Selector([0x35, 0x93, 0x56, 0x4c]);

/// WETH `deposit()`
pub const WETH_DEPOSIT: Selector = Selector([0xd0, 0xe3, 0x0d, 0xb0]);

/// WETH `withdraw(uint256)`
pub const WETH_WITHDRAW: Selector = Selector([0x2e, 0x1a, 0x7d, 0x4d]);

/// Aave v3 Pool `supply(address,uint256,address,uint16)`
pub const AAVE_SUPPLY: Selector = Selector([0x61, 0x7b, 0xa0, 0x37]);

/// Aave v3 Pool `withdraw(address,uint256,address)`
pub const AAVE_WITHDRAW: Selector = Selector([0x69, 0x32, 0x8d, 0xec]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors_match_signatures() {
        assert_eq!(Selector::of_signature("transfer(address,uint256)"), ERC20_TRANSFER);
        assert_eq!(
            Selector::of_signature("execute(bytes,bytes[],uint256)"),
            ROUTER_EXECUTE
        );
        assert_eq!(Selector::of_signature("deposit()"), WETH_DEPOSIT);
        assert_eq!(Selector::of_signature("withdraw(uint256)"), WETH_WITHDRAW);
        assert_eq!(
            Selector::of_signature("supply(address,uint256,address,uint16)"),
            AAVE_SUPPLY
        );
        assert_eq!(
            Selector::of_signature("withdraw(address,uint256,address)"),
            AAVE_WITHDRAW
        );
    }

    #[test]
    fn test_from_calldata() {
        assert_eq!(Selector::from_calldata(&[]), None);
        assert_eq!(Selector::from_calldata(&[0xa9, 0x05, 0x9c]), None);
        assert_eq!(
            Selector::from_calldata(&[0xa9, 0x05, 0x9c, 0xbb, 0x00]),
            Some(ERC20_TRANSFER)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ERC20_TRANSFER.to_string(), "0xa9059cbb");
        assert_eq!(ROUTER_EXECUTE.to_hex(), "3593564c");
    }
}
