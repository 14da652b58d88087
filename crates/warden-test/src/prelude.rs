//! Prelude module - commonly used test helpers.
//!
//! Use `use warden_test::prelude::*;` in test modules.

pub use crate::calldata::{
    encode_approve, encode_eth_swap, encode_execute, encode_path, encode_token_swap,
    encode_transfer, encode_v3_swap_exact_in, encode_wrap_eth,
};
pub use crate::fixtures::*;
pub use crate::harness::{TestContext, setup_test_logging};
