//! Test doubles for the quote seam.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use warden_crypto::Address;

use crate::quote::{QuoteError, QuoteResult, QuoteSource};

/// A quote request as seen by [`MockQuoteSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCall {
    /// Chain id.
    pub chain_id: u64,
    /// Input token.
    pub token_in: Address,
    /// Output token.
    pub token_out: Address,
    /// Exact input.
    pub amount_in: u64,
    /// Pool fee tier.
    pub fee: u32,
}

/// Scriptable [`QuoteSource`].
///
/// Returns a fixed response, optionally after a delay, and records every call.
#[derive(Debug)]
pub struct MockQuoteSource {
    response: QuoteResult<u64>,
    delay: Option<Duration>,
    calls: Mutex<Vec<QuoteCall>>,
}

impl MockQuoteSource {
    /// Always quote `amount_out`.
    #[must_use]
    pub fn returning(amount_out: u64) -> Self {
        Self {
            response: Ok(amount_out),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with `error`.
    #[must_use]
    pub fn failing(error: QuoteError) -> Self {
        Self {
            response: Err(error),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<QuoteCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn quote_exact_input_single(
        &self,
        chain_id: u64,
        token_in: Address,
        token_out: Address,
        amount_in: u64,
        fee: u32,
    ) -> QuoteResult<u64> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(QuoteCall {
                chain_id,
                token_in,
                token_out,
                amount_in,
                fee,
            });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}
