//! Transaction intents submitted for authorization.

use warden_crypto::Address;

use crate::selector::Selector;

/// A proposed on-chain call awaiting a decision.
///
/// Amounts are in the smallest unit of the native asset (wei).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// Chain the call targets.
    pub chain_id: u64,
    /// Smart account that would send the call.
    pub wallet: Address,
    /// Contract or account being called.
    pub target: Address,
    /// Native value attached to the call.
    pub value: u64,
    /// Raw call payload; the first four bytes are the selector.
    pub calldata: Vec<u8>,
}

impl Intent {
    /// Create a native transfer intent with empty calldata.
    #[must_use]
    pub fn new(chain_id: u64, wallet: Address, target: Address, value: u64) -> Self {
        Self {
            chain_id,
            wallet,
            target,
            value,
            calldata: Vec::new(),
        }
    }

    /// Attach calldata.
    #[must_use]
    pub fn with_calldata(mut self, calldata: impl Into<Vec<u8>>) -> Self {
        self.calldata = calldata.into();
        self
    }

    /// The call's selector, if the calldata carries one.
    #[must_use]
    pub fn selector(&self) -> Option<Selector> {
        Selector::from_calldata(&self.calldata)
    }

    /// Whether this is a bare native transfer.
    #[must_use]
    pub fn is_native_transfer(&self) -> bool {
        self.calldata.is_empty()
    }
}
