//! Error types for license issuance.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of issuance failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input was rejected before any key sourcing.
    Validation,
    /// A key file could not be read.
    Io,
    /// Key generation, key decoding or the RSA transform failed.
    Crypto,
}

/// Issuance errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Request rejected (e.g. missing license holder).
    #[error("invalid license request: {0}")]
    Validation(String),

    /// A supplied key file could not be read.
    #[error("failed to read key file {}: {source}", path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// RSA key generation or PEM encoding failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Key material could not be decoded.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Serialized record does not fit in one RSA block.
    #[error("license payload too large: {len} bytes exceeds {max} byte limit for this key")]
    PayloadTooLarge { len: usize, max: usize },

    /// The private-key transform failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The public-key inverse transform did not yield a well-formed payload.
    #[error("payload recovery failed: {0}")]
    Recovery(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::KeyRead { .. } => ErrorKind::Io,
            Self::KeyGeneration(_)
            | Self::InvalidKey(_)
            | Self::PayloadTooLarge { .. }
            | Self::Signing(_)
            | Self::Recovery(_)
            | Self::Serialization(_) => ErrorKind::Crypto,
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
