#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the warden daemon.
//!
//! Holds the persisted effective inputs of the policy core: active profile
//! and overrides, wallet identity, allowlist, freeze flag, approval limits,
//! quote timeout and logging.
//!
//! # Usage
//!
//! ```rust,no_run
//! use warden_config::WardenConfig;
//!
//! let resolved = WardenConfig::load(None).unwrap();
//! println!("profile: {}", resolved.config.policy.profile);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. An explicitly passed config file
//! 2. User config (`~/.warden/config.toml`)
//! 3. Environment variables (`WARDEN_*`), fallback only
//! 4. Embedded defaults (`defaults.toml`)
//!
//! This crate depends on no other warden crate. Conversion into policy types
//! happens in `warden-policy`.

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Layer merging with source tracking.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadOptions, ResolvedConfig};
pub use merge::ConfigLayer;
pub use types::*;

impl WardenConfig {
    /// Load with full precedence, optionally merging `config_file` on top.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the merged
    /// configuration fails validation.
    pub fn load(config_file: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            config_file: config_file.map(std::path::Path::to_path_buf),
            ..LoadOptions::default()
        })
    }

    /// Load a single file with no layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate a TOML string with no layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string fails to parse or validate.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_owned(),
            source: e,
        })?;
        validate::validate(&config)?;
        Ok(config)
    }
}
