//! Market quote capability and slippage math.
//!
//! The engine asks a [`QuoteSource`] for the expected output of an exact
//! input single-pool swap and compares it with the swap's `amountOutMin`.
//! Every failure on this seam is fail-closed: the caller turns it into
//! `RequireApproval`.

use async_trait::async_trait;
use std::fmt;

use warden_crypto::Address;

/// Errors from a quote source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// No quoter is deployed or configured for the chain.
    #[error("no quoter available on chain {chain_id}")]
    Unavailable {
        /// Chain that was asked for.
        chain_id: u64,
    },

    /// The RPC call failed.
    #[error("quote rpc failed: {0}")]
    Rpc(String),

    /// The quote did not arrive in time.
    #[error("quote timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The pool quoted zero output.
    #[error("quoter returned zero output")]
    ZeroQuote,
}

/// Result type for quote operations.
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Source of fresh market quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Expected output for swapping exactly `amount_in` of `token_in` into
    /// `token_out` through the pool with fee tier `fee`.
    async fn quote_exact_input_single(
        &self,
        chain_id: u64,
        token_in: Address,
        token_out: Address,
        amount_in: u64,
        fee: u32,
    ) -> QuoteResult<u64>;
}

/// Result of comparing a swap's minimum output against a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageCheck {
    /// Slippage is within the limit.
    Within {
        /// Computed slippage in basis points.
        bps: u32,
    },
    /// Slippage is above the limit.
    Exceeds {
        /// Computed slippage in basis points.
        bps: u32,
        /// The profile limit.
        max_bps: u32,
    },
}

impl SlippageCheck {
    /// Compare `amount_out_min` against `quote`.
    ///
    /// Slippage is `(quote - min) * 10_000 / quote`, truncated. A minimum at
    /// or above the quote is zero slippage. `quote` must be non-zero.
    #[must_use]
    pub fn evaluate(quote: u64, amount_out_min: u64, max_bps: u32) -> Self {
        let bps = slippage_bps(quote, amount_out_min);
        if bps > max_bps {
            Self::Exceeds { bps, max_bps }
        } else {
            Self::Within { bps }
        }
    }

    /// Computed slippage in basis points.
    #[must_use]
    pub fn bps(&self) -> u32 {
        match self {
            Self::Within { bps } | Self::Exceeds { bps, .. } => *bps,
        }
    }

    /// Check if the limit holds.
    #[must_use]
    pub fn is_within(&self) -> bool {
        matches!(self, Self::Within { .. })
    }
}

impl fmt::Display for SlippageCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Within { bps } => write!(f, "slippage {} within limit", format_bps(*bps)),
            Self::Exceeds { bps, max_bps } => write!(
                f,
                "Slippage {} exceeds limit {}",
                format_bps(*bps),
                format_bps(*max_bps)
            ),
        }
    }
}

/// Slippage of `amount_out_min` relative to `quote`, in basis points.
#[must_use]
pub fn slippage_bps(quote: u64, amount_out_min: u64) -> u32 {
    if quote == 0 || amount_out_min >= quote {
        return 0;
    }
    let shortfall = u128::from(quote.saturating_sub(amount_out_min));
    let bps = shortfall.saturating_mul(10_000) / u128::from(quote);
    u32::try_from(bps).unwrap_or(u32::MAX)
}

/// Render basis points as a percentage with one decimal (truncated).
#[must_use]
pub fn format_bps(bps: u32) -> String {
    format!("{}.{}%", bps / 100, (bps % 100) / 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slippage_bps() {
        assert_eq!(slippage_bps(1_000_000, 990_000), 100);
        assert_eq!(slippage_bps(1_000_000, 1_000_000), 0);
        assert_eq!(slippage_bps(1_000_000, 2_000_000), 0);
        assert_eq!(slippage_bps(1_000_000, 0), 10_000);
        assert_eq!(slippage_bps(0, 5), 0);
        // Truncates.
        assert_eq!(slippage_bps(3, 2), 3333);
    }

    #[test]
    fn test_slippage_no_overflow_at_u64_max() {
        assert_eq!(slippage_bps(u64::MAX, u64::MAX / 2), 5000);
    }

    #[test]
    fn test_slippage_check() {
        let check = SlippageCheck::evaluate(1_000_000, 985_000, 100);
        assert_eq!(
            check,
            SlippageCheck::Exceeds {
                bps: 150,
                max_bps: 100
            }
        );
        assert_eq!(check.to_string(), "Slippage 1.5% exceeds limit 1.0%");

        let ok = SlippageCheck::evaluate(1_000_000, 995_000, 100);
        assert!(ok.is_within());
        assert_eq!(ok.bps(), 50);
    }

    #[test]
    fn test_boundary_is_within() {
        assert!(SlippageCheck::evaluate(1_000_000, 990_000, 100).is_within());
    }

    #[test]
    fn test_format_bps() {
        assert_eq!(format_bps(0), "0.0%");
        assert_eq!(format_bps(5), "0.0%");
        assert_eq!(format_bps(250), "2.5%");
        assert_eq!(format_bps(10_000), "100.0%");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            QuoteError::Timeout { timeout_ms: 5000 }.to_string(),
            "quote timed out after 5000ms"
        );
        assert_eq!(
            QuoteError::Unavailable { chain_id: 10 }.to_string(),
            "no quoter available on chain 10"
        );
    }
}
