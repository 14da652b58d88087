//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_policy::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalLimits, ApprovalManager, ApprovalOutcome, Decision, DecodedIntent, Intent,
    IssuedApproval, PolicyEngine, PolicyError, PolicyResult, QuoteError, QuoteSource,
    SecurityProfile, SpendCheck, SpendingTracker,
};

pub use crate::approval::compute_intent_hash;
