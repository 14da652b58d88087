//! Intent-bound, single-use approval codes.
//!
//! When the engine returns `RequireApproval`, the handler asks the
//! [`ApprovalManager`] for an 8-digit code and shows it to the human out of
//! band. The code is bound to the transaction content through an intent
//! hash, so a code minted for one transaction cannot authorize another.
//!
//! Each pending approval ends in exactly one of: verified and consumed,
//! expired, or revoked after repeated failures.
//!
//! # Verification order
//!
//! 1. Five or more global failures in the trailing minute -> `RateLimited`
//! 2. Purge entries past their expiry
//! 3. Unknown code -> record a global failure, `Invalid`
//! 4. Per-code failures at the limit -> delete, `Revoked`
//! 5. At expiry -> delete, `Expired`
//! 6. Intent hash mismatch -> record a global failure, `Invalid`
//! 7. Otherwise -> delete, `Approved`

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use warden_crypto::ContentHash;
use warden_crypto::abi::AbiPacker;

use crate::clock::{Clock, SystemClock};
use crate::intent::Intent;

/// Codes are uniform over `0..CODE_SPACE`, rendered as 8 digits.
const CODE_SPACE: u32 = 100_000_000;

/// Limits governing approval codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalLimits {
    /// How long a code stays valid.
    pub expiry: Duration,
    /// Failed attempts after which a code is revoked.
    pub max_failed_per_code: u32,
    /// Global failures tolerated within `failure_window`.
    pub max_global_failures: usize,
    /// Sliding window for global failures.
    pub failure_window: Duration,
}

impl ApprovalLimits {
    /// Set the code lifetime in seconds.
    #[must_use]
    pub fn with_expiry_secs(mut self, secs: u32) -> Self {
        self.expiry = Duration::seconds(i64::from(secs));
        self
    }

    /// Set the per-code failure limit.
    #[must_use]
    pub fn with_max_failed_per_code(mut self, max: u32) -> Self {
        self.max_failed_per_code = max;
        self
    }

    /// Set the global failure limit per window.
    #[must_use]
    pub fn with_max_global_failures(mut self, max: usize) -> Self {
        self.max_global_failures = max;
        self
    }
}

impl Default for ApprovalLimits {
    fn default() -> Self {
        Self {
            expiry: Duration::seconds(180),
            max_failed_per_code: 3,
            max_global_failures: 5,
            failure_window: Duration::seconds(60),
        }
    }
}

/// A freshly issued approval, handed to the UI layer.
#[derive(Clone)]
pub struct IssuedApproval {
    /// The 8-digit code to show the human.
    pub code: String,
    /// Hash binding the intent and the expiry.
    pub approval_hash: ContentHash,
    /// Hash binding only the intent fields.
    pub intent_hash: ContentHash,
    /// Human-readable description of the transaction.
    pub summary: String,
    /// When the code stops working.
    pub expires_at: DateTime<Utc>,
}

impl IssuedApproval {
    /// First 8 hex digits of the approval hash, for display next to the code.
    #[must_use]
    pub fn hash_prefix(&self) -> String {
        self.approval_hash.short_hex()
    }

    /// Whole seconds until expiry, as seen at `now`.
    #[must_use]
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at.signed_duration_since(now).num_seconds().max(0)
    }
}

impl fmt::Debug for IssuedApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedApproval")
            .field("code", &"<redacted>")
            .field("approval_hash", &self.approval_hash)
            .field("summary", &self.summary)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Companion-facing view of a pending approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApprovalInfo {
    /// The code awaiting entry.
    pub code: String,
    /// Transaction summary.
    pub summary: String,
    /// First 8 hex digits of the approval hash.
    pub hash_prefix: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry.
    pub expires_in_secs: i64,
}

/// Outcome of verifying a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The code matches the intent; it has been consumed.
    Approved {
        /// Hash of the approved intent and expiry.
        approval_hash: ContentHash,
        /// Summary captured at issue time.
        summary: String,
    },
    /// Unknown code, or a code for a different transaction.
    Invalid {
        /// Why.
        reason: String,
    },
    /// The code reached its expiry.
    Expired,
    /// The code was revoked after too many failures.
    Revoked {
        /// Why.
        reason: String,
    },
    /// Too many recent failures; try later.
    RateLimited {
        /// Why.
        reason: String,
    },
}

impl ApprovalOutcome {
    /// Check if the code was accepted.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

impl fmt::Display for ApprovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved { approval_hash, .. } => {
                write!(f, "approved ({})", approval_hash.short_hex())
            },
            Self::Invalid { reason } => write!(f, "invalid: {reason}"),
            Self::Expired => write!(f, "expired"),
            Self::Revoked { reason } => write!(f, "revoked: {reason}"),
            Self::RateLimited { reason } => write!(f, "rate limited: {reason}"),
        }
    }
}

/// Hash of the intent fields alone.
///
/// `keccak(chainId ‖ wallet ‖ target ‖ value ‖ keccak(calldata))`, each
/// field a 32-byte word.
#[must_use]
pub fn compute_intent_hash(intent: &Intent) -> ContentHash {
    intent_words(intent).digest()
}

/// Hash of the intent fields, a reserved zero spend-cap word and the expiry.
#[must_use]
pub fn compute_approval_hash(intent: &Intent, expires_at_unix: u64) -> ContentHash {
    intent_words(intent).uint(0).uint(expires_at_unix).digest()
}

fn intent_words(intent: &Intent) -> AbiPacker {
    AbiPacker::with_words(7)
        .uint(intent.chain_id)
        .address(&intent.wallet)
        .address(&intent.target)
        .uint(intent.value)
        .bytes_hash(&intent.calldata)
}

#[derive(Debug, Clone)]
struct PendingApproval {
    approval_hash: ContentHash,
    intent_hash: ContentHash,
    summary: String,
    expires_at: DateTime<Utc>,
    failed_attempts: u32,
}

#[derive(Debug, Default)]
struct ApprovalState {
    pending: HashMap<String, PendingApproval>,
    failures: Vec<DateTime<Utc>>,
}

impl ApprovalState {
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.pending.retain(|_, p| p.expires_at >= now);
    }

    fn recent_failures(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = now.checked_sub_signed(window).unwrap_or(now);
        self.failures.retain(|t| *t > cutoff);
        self.failures.len()
    }

    /// Append a failure, dropping entries that fell out of the window.
    fn push_failure(&mut self, now: DateTime<Utc>, window: Duration) {
        self.recent_failures(now, window);
        self.failures.push(now);
    }
}

/// Issues and verifies approval codes.
///
/// Thread-safe via an internal [`Mutex`]; issuance, verification and
/// failure recording are fully serialized.
pub struct ApprovalManager {
    clock: Arc<dyn Clock>,
    limits: ApprovalLimits,
    state: Mutex<ApprovalState>,
}

impl ApprovalManager {
    /// Create a manager with default limits on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(ApprovalLimits::default(), Arc::new(SystemClock))
    }

    /// Create a manager with explicit limits and clock.
    #[must_use]
    pub fn with_clock(limits: ApprovalLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            limits,
            state: Mutex::new(ApprovalState::default()),
        }
    }

    /// Create a manager with explicit limits on the system clock.
    #[must_use]
    pub fn with_limits(limits: ApprovalLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// The limits in force.
    #[must_use]
    pub fn limits(&self) -> &ApprovalLimits {
        &self.limits
    }

    fn lock(&self) -> MutexGuard<'_, ApprovalState> {
        self.state.lock().unwrap_or_else(|e| {
            tracing::warn!("ApprovalManager lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Issue a code for `intent`.
    ///
    /// A duplicate code replaces the older entry.
    #[must_use]
    pub fn create_approval(&self, intent: &Intent, summary: impl Into<String>) -> IssuedApproval {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.limits.expiry).unwrap_or(now);
        let expires_unix = u64::try_from(expires_at.timestamp()).unwrap_or(0);

        let code = generate_code();
        let approval_hash = compute_approval_hash(intent, expires_unix);
        let intent_hash = compute_intent_hash(intent);
        let summary = summary.into();

        let mut state = self.lock();
        state.purge_expired(now);
        state.pending.insert(
            code.clone(),
            PendingApproval {
                approval_hash,
                intent_hash,
                summary: summary.clone(),
                expires_at,
                failed_attempts: 0,
            },
        );

        tracing::info!(
            hash_prefix = %approval_hash.short_hex(),
            expires_at = %expires_at,
            pending = state.pending.len(),
            "Issued approval code"
        );

        IssuedApproval {
            code,
            approval_hash,
            intent_hash,
            summary,
            expires_at,
        }
    }

    /// Verify `code` against the intent the caller is about to sign.
    #[must_use]
    pub fn verify(&self, code: &str, expected_intent_hash: &ContentHash) -> ApprovalOutcome {
        let now = self.clock.now();
        let mut state = self.lock();

        let failures = state.recent_failures(now, self.limits.failure_window);
        if failures >= self.limits.max_global_failures {
            tracing::warn!(failures, "Approval verification rate limited");
            return ApprovalOutcome::RateLimited {
                reason: "Too many failed attempts; try again in 1 minute".to_string(),
            };
        }

        state.purge_expired(now);

        let Some(entry) = state.pending.get(code).cloned() else {
            state.push_failure(now, self.limits.failure_window);
            tracing::debug!("Approval code not found");
            return ApprovalOutcome::Invalid {
                reason: "Invalid or expired code".to_string(),
            };
        };

        if entry.failed_attempts >= self.limits.max_failed_per_code {
            state.pending.remove(code);
            tracing::warn!(
                hash_prefix = %entry.approval_hash.short_hex(),
                "Approval revoked after repeated failures"
            );
            return ApprovalOutcome::Revoked {
                reason: "Approval revoked after too many failed attempts".to_string(),
            };
        }

        if now >= entry.expires_at {
            state.pending.remove(code);
            tracing::debug!(hash_prefix = %entry.approval_hash.short_hex(), "Approval expired");
            return ApprovalOutcome::Expired;
        }

        if entry.intent_hash != *expected_intent_hash {
            state.push_failure(now, self.limits.failure_window);
            tracing::info!(
                hash_prefix = %entry.approval_hash.short_hex(),
                "Approval code presented for a different transaction"
            );
            return ApprovalOutcome::Invalid {
                reason: "Code does not match this transaction".to_string(),
            };
        }

        state.pending.remove(code);
        tracing::info!(hash_prefix = %entry.approval_hash.short_hex(), "Approval verified");
        ApprovalOutcome::Approved {
            approval_hash: entry.approval_hash,
            summary: entry.summary,
        }
    }

    /// Count a failed attempt against `code` (e.g. a rejected biometric).
    ///
    /// The code is deleted once it reaches the per-code limit. A global
    /// failure is always recorded.
    pub fn record_failure(&self, code: &str) {
        let now = self.clock.now();
        let max = self.limits.max_failed_per_code;
        let mut state = self.lock();

        let revoke = match state.pending.get_mut(code) {
            Some(entry) => {
                entry.failed_attempts = entry.failed_attempts.saturating_add(1);
                entry.failed_attempts >= max
            },
            None => false,
        };
        if revoke && let Some(entry) = state.pending.remove(code) {
            tracing::warn!(
                hash_prefix = %entry.approval_hash.short_hex(),
                "Approval revoked after repeated failures"
            );
        }
        state.push_failure(now, self.limits.failure_window);
    }

    /// Number of live pending approvals.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        state.purge_expired(now);
        state.pending.len()
    }

    /// Live pending approvals, soonest expiry first.
    #[must_use]
    pub fn pending_approvals(&self) -> Vec<PendingApprovalInfo> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.purge_expired(now);
        let mut out: Vec<PendingApprovalInfo> = state
            .pending
            .iter()
            .map(|(code, p)| PendingApprovalInfo {
                code: code.clone(),
                summary: p.summary.clone(),
                hash_prefix: p.approval_hash.short_hex(),
                expires_at: p.expires_at,
                expires_in_secs: p.expires_at.signed_duration_since(now).num_seconds().max(0),
            })
            .collect();
        out.sort_by_key(|p| p.expires_at);
        out
    }
}

impl Default for ApprovalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApprovalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ApprovalManager")
            .field("limits", &self.limits)
            .field("pending", &state.pending.len())
            .field("recent_failures", &state.failures.len())
            .finish_non_exhaustive()
    }
}

fn generate_code() -> String {
    let n = rand::rngs::OsRng.gen_range(0..CODE_SPACE);
    format!("{n:08}")
}
