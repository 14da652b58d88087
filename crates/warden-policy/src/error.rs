use warden_crypto::CryptoError;

/// Errors raised while constructing or reconfiguring the policy core.
///
/// Policy outcomes themselves are never errors; see [`Decision`](crate::Decision).
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The named security profile does not exist.
    #[error("unknown security profile: {name}")]
    UnknownProfile {
        /// The requested profile name.
        name: String,
    },

    /// An address in configuration could not be parsed.
    #[error("invalid address in {field}: {source}")]
    InvalidAddress {
        /// Configuration field holding the address.
        field: String,
        /// Underlying parse error.
        #[source]
        source: CryptoError,
    },

    /// Configuration could not be turned into an effective policy.
    #[error("policy configuration error: {0}")]
    Config(String),
}

/// Result type for policy construction.
pub type PolicyResult<T> = Result<T, PolicyError>;
