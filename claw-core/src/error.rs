//! Error types for CLAW.
//!
//! The first four variants are the protocol taxonomy every caller must be
//! able to distinguish. The rest cover registry, serialization and
//! configuration concerns of the surrounding crates.

use thiserror::Error;

/// Result type alias using `ClawError`.
pub type Result<T> = std::result::Result<T, ClawError>;

/// Main error type for all CLAW operations.
#[derive(Debug, Error)]
pub enum ClawError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PROTOCOL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Wrong length or structure of an address, key or ciphertext.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Bytes do not decode to a usable curve point.
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// AEAD tag mismatch (tampered data or wrong key).
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// The operating system RNG could not be read.
    #[error("Secure randomness unavailable: {0}")]
    RandomnessFailure(String),

    /// The record is not addressed to the supplied keys.
    #[error("Transfer is not owned by these keys")]
    NotOwner,

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Transfer record failed structural validation.
    #[error("Invalid transfer record: {0}")]
    InvalidRecord(String),

    /// Registry storage is unreadable or corrupted.
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Stored data was written by another protocol version.
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build understands
        expected: u8,
        /// Version found in the data
        actual: u8,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE / CONFIG ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ClawError {
    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            ClawError::InvalidPoint(_)
                | ClawError::AuthenticationFailure(_)
                | ClawError::RandomnessFailure(_)
                | ClawError::NotOwner
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ClawError::InvalidFormat(_)
                | ClawError::InvalidRecord(_)
                | ClawError::ValidationError(_)
                | ClawError::HexError(_)
                | ClawError::VersionMismatch { .. }
        )
    }

    /// Returns true if the error must abort the process rather than be handled.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClawError::RandomnessFailure(_))
    }
}
