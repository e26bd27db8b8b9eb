//! Trial licensing settings read from a TOML file.
//!
//! ```toml
//! subject = "acme-editor"
//! trial_days = 30
//!
//! [trust_anchor]
//! location = "keys/public.ks"
//! alias = "regular"
//!
//! [trial_trust_anchor]
//! location = "keys/trial.ks"
//! alias = "trial"
//! ```

use crate::anchor::TrustAnchorConfig;
use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_trial_days() -> u32 {
    30
}

/// Parsed settings file. Validation happens when the resulting parameters
/// are handed to a license manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSettings {
    pub subject: String,
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
    pub trust_anchor: TrustAnchorConfig,
    #[serde(default)]
    pub trial_trust_anchor: Option<TrustAnchorConfig>,
}

impl TrialSettings {
    /// Parses settings from a TOML string.
    pub fn from_toml_str(contents: &str) -> LicenseResult<Self> {
        toml::from_str(contents).map_err(|e| LicenseError::Settings(e.to_string()))
    }

    /// Reads settings from `path`.
    pub fn load_from(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LicenseError::Settings(format!("failed to read {}: {e}", path.display()))
        })?;
        let settings = Self::from_toml_str(&contents)?;
        info!(subject = %settings.subject, "Loaded license settings from {:?}", path);
        Ok(settings)
    }
}
