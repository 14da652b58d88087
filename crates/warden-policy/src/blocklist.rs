//! Selectors that can grant open-ended control over wallet assets.
//!
//! A call starting with any of these always needs a human, regardless of
//! amount, destination or profile.

use crate::selector::Selector;

/// A blocked selector and the signature it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedSelector {
    /// The selector bytes.
    pub selector: Selector,
    /// Human-readable signature.
    pub signature: &'static str,
}

/// Every blocked selector.
pub const BLOCKED_SELECTORS: &[BlockedSelector] = &[
    BlockedSelector {
        selector: Selector([0x09, 0x5e, 0xa7, 0xb3]),
        signature: "approve(address,uint256)",
    },
    BlockedSelector {
        selector: Selector([0x39, 0x50, 0x93, 0x51]),
        signature: "increaseAllowance(address,uint256)",
    },
    BlockedSelector {
        selector: Selector([0xa2, 0x2c, 0xb4, 0x65]),
        signature: "setApprovalForAll(address,bool)",
    },
    BlockedSelector {
        selector: Selector([0xd5, 0x05, 0xac, 0xcf]),
        signature: "permit(address,address,uint256,uint256,uint8,bytes32,bytes32)",
    },
    BlockedSelector {
        selector: Selector([0x8f, 0xcb, 0xaf, 0x0c]),
        signature: "permit(address,address,uint256,uint256,bool,uint8,bytes32,bytes32)",
    },
    BlockedSelector {
        selector: Selector([0x87, 0x51, 0x7c, 0x45]),
        signature: "approve(address,address,uint160,uint48)",
    },
    BlockedSelector {
        selector: Selector([0x2b, 0x67, 0xb5, 0x70]),
        signature: "permit(address,((address,uint160,uint48,uint48),address,uint256),bytes)",
    },
    BlockedSelector {
        selector: Selector([0x2a, 0x2d, 0x80, 0xd1]),
        signature: "permit(address,((address,uint160,uint48,uint48)[],address,uint256),bytes)",
    },
];

/// Find the blocklist entry for a selector.
#[must_use]
pub fn lookup(selector: Selector) -> Option<&'static BlockedSelector> {
    BLOCKED_SELECTORS.iter().find(|b| b.selector == selector)
}

/// Find the blocklist entry for calldata, if its selector is blocked.
#[must_use]
pub fn check_calldata(calldata: &[u8]) -> Option<&'static BlockedSelector> {
    Selector::from_calldata(calldata).and_then(lookup)
}
