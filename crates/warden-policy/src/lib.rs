//! Warden Policy - the authorization core of the wallet daemon.
//!
//! Every signing request passes through [`PolicyEngine::evaluate`], which
//! returns a [`Decision`]:
//!
//! - [`Decision::Allow`]: sign without asking
//! - [`Decision::RequireApproval`]: show the human an approval code first
//! - [`Decision::Deny`]: refuse
//!
//! Supporting components:
//!
//! - [`decoder`]: classifies calldata into transfers, swaps, protocol calls
//!   and unknown calls
//! - [`SpendingTracker`]: per-transaction, daily, hourly and cooldown limits
//! - [`ApprovalManager`]: single-use, intent-bound 8-digit approval codes
//! - [`QuoteSource`]: the external market quote seam used for slippage checks
//! - [`bridge`]: turns a [`warden_config::WardenConfig`] into an engine
//!
//! # Example
//!
//! ```
//! use warden_crypto::Address;
//! use warden_policy::{Intent, PolicyEngine, SecurityProfile};
//!
//! # tokio_test_block_on(async {
//! let friend = Address::from_bytes([0x22; 20]);
//! let engine = PolicyEngine::new(SecurityProfile::balanced()).with_allowlist([friend]);
//!
//! let intent = Intent::new(8453, Address::from_bytes([0x11; 20]), friend, 10_000_000_000_000_000);
//! assert!(engine.evaluate(&intent).await.is_allowed());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod approval;
pub mod blocklist;
pub mod bridge;
pub mod clock;
pub mod decoder;
pub mod engine;
pub mod intent;
pub mod profile;
pub mod quote;
pub mod registry;
pub mod selector;
pub mod spending;

mod decision;
mod error;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use approval::{
    ApprovalLimits, ApprovalManager, ApprovalOutcome, IssuedApproval, PendingApprovalInfo,
    compute_approval_hash, compute_intent_hash,
};
pub use bridge::EffectivePolicy;
pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::Decision;
pub use decoder::{ActionKind, DecodedIntent, SwapParams};
pub use engine::{DEFAULT_QUOTE_TIMEOUT, PolicyEngine};
pub use error::{PolicyError, PolicyResult};
pub use intent::Intent;
pub use profile::{ProfileOverrides, SecurityProfile};
pub use quote::{QuoteError, QuoteResult, QuoteSource, SlippageCheck};
pub use registry::{
    KnownProtocols, KnownStablecoins, ProtocolMethod, ProtocolRegistry, StablecoinRegistry,
};
pub use selector::Selector;
pub use spending::{
    LimitViolation, RemainingBudgets, SpendCheck, SpendingSnapshot, SpendingTracker,
};
