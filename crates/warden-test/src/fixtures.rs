//! Test fixtures: addresses and amounts.

use warden_crypto::Address;

/// The smart account under test.
pub const WALLET: Address = Address::from_bytes([0x11; 20]);

/// An address that tests put on the allowlist.
pub const RECIPIENT: Address = Address::from_bytes([0x22; 20]);

/// An address that is never allowlisted.
pub const STRANGER: Address = Address::from_bytes([0x33; 20]);

/// A token contract that no registry knows.
pub const UNKNOWN_TOKEN: Address = Address::from_bytes([0x44; 20]);

/// A contract that no registry knows.
pub const UNKNOWN_CONTRACT: Address = Address::from_bytes([0x55; 20]);

/// Base chain id.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Ethereum mainnet chain id.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// USDC on Base.
pub const USDC_BASE: Address = Address::from_bytes([
    0x83, 0x35, 0x89, 0xfc, 0xd6, 0xed, 0xb6, 0xe0, 0x8f, 0x4c, 0x7c, 0x32, 0xd4, 0xf7, 0x1b, 0x54,
    0xbd, 0xa0, 0x29, 0x13,
]);

/// WETH on Base.
pub const WETH_BASE: Address = Address::from_bytes([
    0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x06,
]);

/// Uniswap Universal Router.
pub const ROUTER: Address = Address::from_bytes([
    0x3f, 0xc9, 0x1a, 0x3a, 0xfd, 0x70, 0x39, 0x5c, 0xd4, 0x96, 0xc6, 0x47, 0xd5, 0xa6, 0xcc, 0x9d,
    0x4b, 0x2b, 0x7f, 0xad,
]);

/// 0.01 ETH in wei.
pub const CENTI_ETH: u64 = 10_000_000_000_000_000;

/// 1 USDC in base units.
pub const ONE_USDC: u64 = 1_000_000;
