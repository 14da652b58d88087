//! Warden Test - Shared test utilities for the wallet policy core.
//!
//! This crate provides canonical test addresses, calldata builders for the
//! call shapes the decoder understands, and logging/tempdir harness helpers.
//! It is used as a dev-dependency only.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! warden-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use warden_test::{RECIPIENT, encode_transfer};
//!
//! let calldata = encode_transfer(&RECIPIENT, 100_000_000);
//! assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod calldata;
pub mod fixtures;
pub mod harness;

pub use calldata::*;
pub use fixtures::*;
pub use harness::*;
