//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur while parsing hash-primitive inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid address length.
    #[error("invalid address length: expected {expected} hex digits, got {actual}")]
    InvalidAddressLength {
        /// Expected number of hex digits.
        expected: usize,
        /// Actual number of hex digits.
        actual: usize,
    },

    /// Invalid hash length.
    #[error("invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidHashLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Invalid hex encoding.
    #[error("invalid hex encoding: {0}")]
    InvalidHexEncoding(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        Self::InvalidHexEncoding(e.to_string())
    }
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
