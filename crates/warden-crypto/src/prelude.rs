//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_crypto::prelude::*;` to import all essential types.

pub use crate::{Address, ContentHash, CryptoError, CryptoResult, PackedUserOperation};

pub use crate::abi::{AbiPacker, pack_address, pack_uint};
