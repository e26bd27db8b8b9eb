//! Signing and verification authorities bound to a trust anchor.

use crate::anchor::TrustAnchorConfig;
use crate::content::LicenseContent;
use crate::error::{LicenseError, LicenseResult};
use crate::key::SignedLicense;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Signs and verifies license content for exactly one trust anchor.
pub trait LicenseNotary: Send + Sync {
    /// The trust anchor this notary is bound to.
    fn trust_anchor(&self) -> &TrustAnchorConfig;

    /// Signs `content`.
    fn sign(&self, content: &LicenseContent) -> LicenseResult<SignedLicense>;

    /// Verifies the signature and returns the decoded content.
    fn verify(&self, signed: &SignedLicense) -> LicenseResult<LicenseContent>;
}

/// Builds notaries for trust anchors.
pub trait NotaryProvider: Send + Sync {
    fn notary_for(&self, anchor: &TrustAnchorConfig) -> LicenseResult<Arc<dyn LicenseNotary>>;
}

/// Ed25519 notary. Consumers that only verify carry no signing key.
pub struct Ed25519Notary {
    anchor: TrustAnchorConfig,
    verifying_key: VerifyingKey,
    signing_key: Option<SigningKey>,
}

impl Ed25519Notary {
    /// Creates a notary that can sign and verify.
    pub fn with_signing_key(anchor: TrustAnchorConfig, signing_key: SigningKey) -> Self {
        Self {
            anchor,
            verifying_key: signing_key.verifying_key(),
            signing_key: Some(signing_key),
        }
    }

    /// Creates a verify-only notary from a raw 32-byte public key.
    pub fn verify_only(anchor: TrustAnchorConfig, pub_key_bytes: &[u8; 32]) -> LicenseResult<Self> {
        let verifying_key = VerifyingKey::from_bytes(pub_key_bytes)
            .map_err(|_| LicenseError::Notary("invalid public key".to_string()))?;
        Ok(Self {
            anchor,
            verifying_key,
            signing_key: None,
        })
    }
}

impl LicenseNotary for Ed25519Notary {
    fn trust_anchor(&self) -> &TrustAnchorConfig {
        &self.anchor
    }

    fn sign(&self, content: &LicenseContent) -> LicenseResult<SignedLicense> {
        let signing_key = self.signing_key.as_ref().ok_or_else(|| {
            LicenseError::Notary(format!(
                "no private key available for alias '{}'",
                self.anchor.alias
            ))
        })?;

        let payload_b64 = SignedLicense::encode_payload(content)?;
        let signature = signing_key.sign(payload_b64.as_bytes());
        Ok(SignedLicense::new(payload_b64, signature))
    }

    fn verify(&self, signed: &SignedLicense) -> LicenseResult<LicenseContent> {
        self.verifying_key
            .verify(signed.signed_message(), &signed.signature())
            .map_err(|_| LicenseError::InvalidSignature)?;

        signed.decode_content()
    }
}

enum KeyMaterial {
    Signing(SigningKey),
    Verifying([u8; 32]),
}

/// In-memory mapping from trust anchors to Ed25519 key material.
#[derive(Default)]
pub struct Keyring {
    entries: HashMap<TrustAnchorConfig, KeyMaterial>,
}

impl Keyring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a private key; notaries for `anchor` can sign.
    #[must_use]
    pub fn with_signing_key(mut self, anchor: TrustAnchorConfig, key: SigningKey) -> Self {
        self.entries.insert(anchor, KeyMaterial::Signing(key));
        self
    }

    /// Registers a public key; notaries for `anchor` can only verify.
    #[must_use]
    pub fn with_verifying_key(mut self, anchor: TrustAnchorConfig, pub_key_bytes: [u8; 32]) -> Self {
        self.entries.insert(anchor, KeyMaterial::Verifying(pub_key_bytes));
        self
    }

    #[must_use]
    pub fn contains(&self, anchor: &TrustAnchorConfig) -> bool {
        self.entries.contains_key(anchor)
    }
}

impl NotaryProvider for Keyring {
    fn notary_for(&self, anchor: &TrustAnchorConfig) -> LicenseResult<Arc<dyn LicenseNotary>> {
        let material = self.entries.get(anchor).ok_or_else(|| {
            LicenseError::Notary(format!(
                "no key registered for trust anchor '{}'",
                anchor.alias
            ))
        })?;

        debug!(anchor = %anchor.fingerprint(), alias = %anchor.alias, "Building license notary");

        let notary = match material {
            KeyMaterial::Signing(key) => Ed25519Notary::with_signing_key(anchor.clone(), key.clone()),
            KeyMaterial::Verifying(bytes) => Ed25519Notary::verify_only(anchor.clone(), bytes)?,
        };
        Ok(Arc::new(notary))
    }
}
