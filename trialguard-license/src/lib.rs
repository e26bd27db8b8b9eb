//! Free trial period licensing.
//!
//! This crate handles:
//! - Verification of signed license keys against a regular trust anchor
//! - Automatic, one-time issuance of a time-limited trial license signed by a
//!   second trust anchor when no regular license is present
//! - Validation of the trial configuration before it takes effect
//!
//! # Design Principles
//!
//! - **Composition**: [`TrialLicenseManager`] wraps any [`LicenseEngine`]
//! - **One trial per consumer**: eligibility is revoked only after the trial
//!   key is installed, and issuance runs under the manager's lock
//! - **Distinct anchors**: trial and regular licenses never share a signer
//!
//! # License Key Format
//!
//! Keys are formatted as: `base64url(payload).base64url(signature)`
//! The payload is the JSON [`LicenseContent`] signed with Ed25519.

mod anchor;
mod content;
mod engine;
mod error;
mod key;
mod manager;
mod notary;
mod params;
mod settings;
mod store;

pub use anchor::TrustAnchorConfig;
pub use content::{LicenseContent, Principal};
pub use engine::{
    ContentInitializer, DEFAULT_CONSUMER_TYPE, DEFAULT_HOLDER, LicenseEngine, NoopInitializer,
    StandardLicenseEngine, validate_content,
};
pub use error::{ConfigError, LicenseError, LicenseResult};
pub use key::SignedLicense;
pub use manager::{TRIAL_USER_ROLE, TrialLicenseManager, trial_holder, trial_not_after};
pub use notary::{Ed25519Notary, Keyring, LicenseNotary, NotaryProvider};
pub use params::{
    LicenseParams, MAX_TRIAL_DAYS, TRIAL_CONTENT_INFO, TrialLicenseParams, TrialParams, validate,
};
pub use settings::TrialSettings;
pub use store::{
    EligibilityStore, FileEligibility, FileKeyStore, LicenseKeyStore, MemoryEligibility,
    MemoryKeyStore,
};
