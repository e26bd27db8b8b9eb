//! Trust anchor identities.
//!
//! A trust anchor names the keystore entry that signs and verifies one class
//! of license. Two anchors are the same anchor exactly when every field
//! matches, which is what the trial configuration checks rely on.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

fn default_store_type() -> String {
    "ed25519".to_string()
}

/// Keystore parameters identifying a signing authority.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrustAnchorConfig {
    /// Keystore location (path or resource name).
    pub location: String,
    /// Keystore type.
    #[serde(default = "default_store_type")]
    pub store_type: String,
    /// Alias of the key entry inside the keystore.
    pub alias: String,
    /// Password protecting the keystore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_password: Option<String>,
    /// Password protecting the private key, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password: Option<String>,
}

impl TrustAnchorConfig {
    /// Creates an anchor for `alias` in the keystore at `location`.
    pub fn new(location: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            store_type: default_store_type(),
            alias: alias.into(),
            store_password: None,
            key_password: None,
        }
    }

    #[must_use]
    pub fn with_store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = store_type.into();
        self
    }

    #[must_use]
    pub fn with_store_password(mut self, password: impl Into<String>) -> Self {
        self.store_password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_key_password(mut self, password: impl Into<String>) -> Self {
        self.key_password = Some(password.into());
        self
    }

    /// Returns a short, stable identifier safe to log.
    ///
    /// Passwords are excluded, so two anchors differing only by password
    /// share a fingerprint while still comparing unequal.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.location.as_bytes());
        hasher.update([0]);
        hasher.update(self.store_type.as_bytes());
        hasher.update([0]);
        hasher.update(self.alias.as_bytes());
        let hash = hasher.finalize();
        URL_SAFE_NO_PAD.encode(&hash[..9])
    }
}

impl fmt::Debug for TrustAnchorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchorConfig")
            .field("location", &self.location)
            .field("store_type", &self.store_type)
            .field("alias", &self.alias)
            .field("store_password", &self.store_password.as_ref().map(|_| "***"))
            .field("key_password", &self.key_password.as_ref().map(|_| "***"))
            .finish()
    }
}
