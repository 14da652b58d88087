//! Rolling spend-limit accounting.
//!
//! The [`SpendingTracker`] enforces, in order:
//! 1. per-transaction native cap
//! 2. per-transaction stablecoin cap
//! 3. projected daily native total
//! 4. projected daily stablecoin total
//! 5. transactions in the trailing hour
//! 6. cooldown since the last recorded transaction
//!
//! Daily totals reset lazily on the first access after a UTC day boundary.
//! The hourly log and last-transaction time survive the reset, so rate and
//! cooldown checks keep working across midnight.
//!
//! [`check`](SpendingTracker::check) never mutates totals. Callers invoke
//! [`record`](SpendingTracker::record) only after a transaction is signed.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::decoder::{format_usdc, format_wei};
use crate::profile::SecurityProfile;

/// Cooldowns longer than a year are clamped.
const MAX_COOLDOWN_SECS: u64 = 31_536_000;

/// Result of a spend-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendCheck {
    /// Within every limit.
    Allowed,
    /// A limit would be violated.
    Denied(LimitViolation),
}

impl SpendCheck {
    /// Check if the spend is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Check if the spend is denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

impl fmt::Display for SpendCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "within spending limits"),
            Self::Denied(violation) => write!(f, "{violation}"),
        }
    }
}

/// Which limit a spend would break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitViolation {
    /// Native amount above the per-transaction cap.
    PerTxNative {
        /// Requested amount (wei).
        amount: u64,
        /// Cap (wei).
        cap: u64,
    },
    /// Stablecoin amount above the per-transaction cap.
    PerTxStablecoin {
        /// Requested amount.
        amount: u64,
        /// Cap.
        cap: u64,
    },
    /// Native daily total would exceed the daily cap.
    DailyNative {
        /// Already spent today (wei).
        spent: u64,
        /// Requested amount (wei).
        amount: u64,
        /// Cap (wei).
        cap: u64,
    },
    /// Stablecoin daily total would exceed the daily cap.
    DailyStablecoin {
        /// Already spent today.
        spent: u64,
        /// Requested amount.
        amount: u64,
        /// Cap.
        cap: u64,
    },
    /// Too many transactions in the trailing hour.
    HourlyRate {
        /// Transactions in the trailing hour.
        count: usize,
        /// Allowed per hour.
        max: u32,
    },
    /// Too soon after the previous transaction.
    Cooldown {
        /// Seconds until the cooldown ends.
        remaining_secs: i64,
    },
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerTxNative { amount, cap } => write!(
                f,
                "ETH amount {} exceeds per-tx cap {}",
                format_wei(*amount),
                format_wei(*cap)
            ),
            Self::PerTxStablecoin { amount, cap } => write!(
                f,
                "Stablecoin amount {} exceeds per-tx cap {}",
                format_usdc(*amount),
                format_usdc(*cap)
            ),
            Self::DailyNative { spent, amount, cap } => write!(
                f,
                "Daily ETH cap exceeded: {} spent + {} > {}",
                format_wei(*spent),
                format_wei(*amount),
                format_wei(*cap)
            ),
            Self::DailyStablecoin { spent, amount, cap } => write!(
                f,
                "Daily stablecoin cap exceeded: {} spent + {} > {}",
                format_usdc(*spent),
                format_usdc(*amount),
                format_usdc(*cap)
            ),
            Self::HourlyRate { count, max } => {
                write!(f, "Hourly transaction limit reached ({count}/{max})")
            },
            Self::Cooldown { remaining_secs } => {
                write!(f, "Cooldown active: wait {remaining_secs}s")
            },
        }
    }
}

/// What is left of today's budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingBudgets {
    /// Native budget left today (wei).
    pub native: u64,
    /// Stablecoin budget left today.
    pub stablecoin: u64,
}

/// Point-in-time view of the tracker, for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingSnapshot {
    /// UTC day the totals belong to.
    pub day: NaiveDate,
    /// Native spent that day (wei).
    pub native_spent: u64,
    /// Stablecoin spent that day.
    pub stablecoin_spent: u64,
    /// Transactions recorded in the trailing hour.
    pub tx_last_hour: usize,
    /// When the last transaction was recorded.
    pub last_tx_at: Option<DateTime<Utc>>,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug)]
struct SpendingState {
    day: NaiveDate,
    native_spent: u64,
    stablecoin_spent: u64,
    recent: Vec<DateTime<Utc>>,
    last_tx: Option<DateTime<Utc>>,
}

impl SpendingState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            native_spent: 0,
            stablecoin_spent: 0,
            recent: Vec::new(),
            last_tx: None,
        }
    }

    /// Reset daily totals if `now` falls on a later UTC day.
    fn roll_over(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today > self.day {
            tracing::debug!(
                previous = %self.day,
                today = %today,
                "Spending day rolled over, resetting daily totals"
            );
            self.day = today;
            self.native_spent = 0;
            self.stablecoin_spent = 0;
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now.checked_sub_signed(Duration::hours(1)).unwrap_or(now);
        self.recent.retain(|t| *t > cutoff);
    }
}

/// Per-process spend counters.
///
/// Thread-safe via an internal [`Mutex`]; every operation is serialized.
///
/// # Example
///
/// ```
/// use warden_policy::profile::SecurityProfile;
/// use warden_policy::spending::SpendingTracker;
///
/// let tracker = SpendingTracker::new();
/// let profile = SecurityProfile::balanced();
///
/// assert!(tracker.check(10_000_000_000_000_000, 0, &profile).is_allowed());
/// tracker.record(10_000_000_000_000_000, 0);
/// assert_eq!(
///     tracker.remaining_budgets(&profile).native,
///     240_000_000_000_000_000
/// );
/// ```
pub struct SpendingTracker {
    clock: Arc<dyn Clock>,
    state: Mutex<SpendingState>,
}

impl SpendingTracker {
    /// Create a tracker on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a tracker on an injected clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let state = SpendingState::new(clock.now());
        Self {
            clock,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpendingState> {
        self.state.lock().unwrap_or_else(|e| {
            tracing::warn!("SpendingTracker lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Check a prospective spend against `profile`.
    ///
    /// This does NOT record the spend.
    #[must_use]
    pub fn check(&self, native: u64, stablecoin: u64, profile: &SecurityProfile) -> SpendCheck {
        let now = self.clock.now();
        let mut state = self.lock();
        state.roll_over(now);
        state.prune(now);

        if native > profile.per_tx_native_cap {
            return SpendCheck::Denied(LimitViolation::PerTxNative {
                amount: native,
                cap: profile.per_tx_native_cap,
            });
        }
        if stablecoin > profile.per_tx_stablecoin_cap {
            return SpendCheck::Denied(LimitViolation::PerTxStablecoin {
                amount: stablecoin,
                cap: profile.per_tx_stablecoin_cap,
            });
        }
        if state.native_spent.saturating_add(native) > profile.daily_native_cap {
            return SpendCheck::Denied(LimitViolation::DailyNative {
                spent: state.native_spent,
                amount: native,
                cap: profile.daily_native_cap,
            });
        }
        if state.stablecoin_spent.saturating_add(stablecoin) > profile.daily_stablecoin_cap {
            return SpendCheck::Denied(LimitViolation::DailyStablecoin {
                spent: state.stablecoin_spent,
                amount: stablecoin,
                cap: profile.daily_stablecoin_cap,
            });
        }

        let count = state.recent.len();
        if count >= usize::try_from(profile.max_tx_per_hour).unwrap_or(usize::MAX) {
            return SpendCheck::Denied(LimitViolation::HourlyRate {
                count,
                max: profile.max_tx_per_hour,
            });
        }

        if let Some(last) = state.last_tx {
            let cooldown = Duration::seconds(
                i64::try_from(profile.min_cooldown_secs.min(MAX_COOLDOWN_SECS)).unwrap_or(0),
            );
            let elapsed = now.signed_duration_since(last);
            if elapsed < cooldown {
                let remaining_secs = cooldown
                    .checked_sub(&elapsed)
                    .map_or(0, |d| d.num_seconds())
                    .max(1);
                return SpendCheck::Denied(LimitViolation::Cooldown { remaining_secs });
            }
        }

        SpendCheck::Allowed
    }

    /// Record a signed transaction.
    pub fn record(&self, native: u64, stablecoin: u64) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.roll_over(now);
        state.native_spent = state.native_spent.saturating_add(native);
        state.stablecoin_spent = state.stablecoin_spent.saturating_add(stablecoin);
        state.recent.push(now);
        state.last_tx = Some(now);
        state.prune(now);
        tracing::debug!(
            native,
            stablecoin,
            native_spent = state.native_spent,
            stablecoin_spent = state.stablecoin_spent,
            "Recorded transaction"
        );
    }

    /// Budgets left today under `profile`.
    #[must_use]
    pub fn remaining_budgets(&self, profile: &SecurityProfile) -> RemainingBudgets {
        let now = self.clock.now();
        let state = self.lock();
        let (native_spent, stablecoin_spent) = if now.date_naive() > state.day {
            (0, 0)
        } else {
            (state.native_spent, state.stablecoin_spent)
        };
        RemainingBudgets {
            native: profile.daily_native_cap.saturating_sub(native_spent),
            stablecoin: profile.daily_stablecoin_cap.saturating_sub(stablecoin_spent),
        }
    }

    /// Take a snapshot of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> SpendingSnapshot {
        let now = self.clock.now();
        let mut state = self.lock();
        state.roll_over(now);
        state.prune(now);
        SpendingSnapshot {
            day: state.day,
            native_spent: state.native_spent,
            stablecoin_spent: state.stablecoin_spent,
            tx_last_hour: state.recent.len(),
            last_tx_at: state.last_tx,
            taken_at: now,
        }
    }
}

impl Default for SpendingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpendingTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SpendingTracker")
            .field("day", &state.day)
            .field("native_spent", &state.native_spent)
            .field("stablecoin_spent", &state.stablecoin_spent)
            .finish_non_exhaustive()
    }
}
