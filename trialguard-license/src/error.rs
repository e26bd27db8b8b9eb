//! Error types for the licensing module.

use thiserror::Error;

/// Rejections raised while applying a trial license configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingField(&'static str),

    /// The trial trust anchor equals the one used for regular licenses.
    #[error("equal trust anchors for regular and trial licenses")]
    DuplicateTrustAnchor,

    /// Trial duration outside of `1..=365` days.
    #[error("invalid trial duration: {0} days (expected 1..=365)")]
    InvalidDuration(u32),
}

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Configuration rejected; the previous configuration is still active.
    #[error("invalid license configuration: {0}")]
    Config(#[from] ConfigError),

    /// Neither the regular nor the trial trust anchor accepted the installed key.
    #[error("license verification failed")]
    VerificationFailed,

    /// No key installed and the consumer is not eligible for a trial.
    #[error("no license installed for subject '{0}'")]
    NoLicenseInstalled(String),

    /// Creating, signing or installing a trial license failed.
    #[error("trial license issuance failed: {0}")]
    IssuanceFailed(#[source] Box<LicenseError>),

    /// Invalid license key format.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Ed25519 signature verification failed.
    #[error("license key signature invalid")]
    InvalidSignature,

    /// Payload JSON is malformed or missing required fields.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// License was issued for another subject.
    #[error("license subject mismatch: expected '{expected}', found '{found}'")]
    InvalidSubject { expected: String, found: String },

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// License is not valid before the given date.
    #[error("license not valid before {0}")]
    NotYetValid(String),

    /// No usable key material for a trust anchor.
    #[error("notary error: {0}")]
    Notary(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Settings file could not be read or parsed.
    #[error("settings error: {0}")]
    Settings(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
