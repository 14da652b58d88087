//! Warden Crypto - Canonical hash primitives for the wallet policy core.
//!
//! This crate provides:
//! - [`Address`]: a 20-byte account address with lowercase hex normalization
//! - [`ContentHash`]: Keccak-256 content hashing (the chain's standard hash)
//! - [`abi`]: fixed-width, big-endian ABI word packing and word readers
//! - [`PackedUserOperation`]: the EIP-712 digest the key-custody layer signs
//!
//! Every function here is pure. Approval binding and transaction hashing both
//! go through the same packing code, so a padding or endianness bug shows up
//! in both places and is caught by the byte-exact vectors in the tests.
//!
//! # Example
//!
//! ```
//! use warden_crypto::{Address, ContentHash, abi};
//!
//! let wallet = Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
//! let packed = abi::AbiPacker::new().uint(8453).address(&wallet).finish();
//! assert_eq!(packed.len(), 64);
//!
//! let digest = ContentHash::hash(&packed);
//! println!("digest: {}", digest.to_prefixed_hex());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod abi;
mod address;
mod error;
mod hash;
mod user_op;

pub use address::Address;
pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use user_op::{
    DEFAULT_ENTRY_POINT, DOMAIN_NAME, DOMAIN_VERSION, EIP712_DOMAIN_TYPE, PACKED_USER_OP_TYPE,
    PackedUserOperation,
};
