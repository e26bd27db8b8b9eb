//! Signed license key encoding.
//!
//! License keys use the format: `base64url(payload).base64url(signature)`
//!
//! The payload is the JSON encoded [`LicenseContent`]. The signature covers
//! `payload_b64.as_bytes()` (the base64url-encoded payload string, not the
//! decoded JSON), so a key can be checked without re-serializing anything.

use crate::content::LicenseContent;
use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::Signature;

/// A license payload together with its detached Ed25519 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLicense {
    payload_b64: String,
    signature: [u8; 64],
}

impl SignedLicense {
    pub(crate) fn new(payload_b64: String, signature: Signature) -> Self {
        Self {
            payload_b64,
            signature: signature.to_bytes(),
        }
    }

    /// Parses a key string. The signature is *not* verified here.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not have two base64url parts or the
    /// signature has the wrong length.
    pub fn parse(key: &str) -> LicenseResult<Self> {
        let key = key.trim();

        let Some((payload_b64, signature_b64)) = key.split_once('.') else {
            return Err(LicenseError::InvalidKeyFormat(
                "key must have exactly two parts separated by a dot".to_string(),
            ));
        };
        if signature_b64.contains('.') {
            return Err(LicenseError::InvalidKeyFormat(
                "key must have exactly two parts separated by a dot".to_string(),
            ));
        }

        URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
            LicenseError::InvalidKeyFormat(format!("invalid payload base64: {e}"))
        })?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
            LicenseError::InvalidKeyFormat(format!("invalid signature base64: {e}"))
        })?;

        let signature: [u8; 64] = sig_bytes.try_into().map_err(|_| {
            LicenseError::InvalidKeyFormat("invalid signature length".to_string())
        })?;

        Ok(Self {
            payload_b64: payload_b64.to_string(),
            signature,
        })
    }

    /// Parses a key from the raw bytes kept by a key store.
    pub fn from_bytes(bytes: &[u8]) -> LicenseResult<Self> {
        let key = std::str::from_utf8(bytes).map_err(|_| {
            LicenseError::InvalidKeyFormat("key is not valid UTF-8".to_string())
        })?;
        Self::parse(key)
    }

    /// Returns the key string.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}.{}",
            self.payload_b64,
            URL_SAFE_NO_PAD.encode(self.signature)
        )
    }

    /// Returns the key as bytes, ready for a key store.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode().into_bytes()
    }

    /// Returns the signed message, i.e. the base64url payload.
    #[must_use]
    pub fn signed_message(&self) -> &[u8] {
        self.payload_b64.as_bytes()
    }

    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::from_bytes(&self.signature)
    }

    /// Decodes the payload without checking the signature.
    pub fn decode_content(&self) -> LicenseResult<LicenseContent> {
        let payload_json = URL_SAFE_NO_PAD.decode(&self.payload_b64).map_err(|e| {
            LicenseError::InvalidKeyFormat(format!("invalid payload base64: {e}"))
        })?;

        serde_json::from_slice(&payload_json)
            .map_err(|e| LicenseError::InvalidPayload(format!("invalid payload JSON: {e}")))
    }

    /// Encodes `content` as a base64url payload.
    pub(crate) fn encode_payload(content: &LicenseContent) -> LicenseResult<String> {
        let json = serde_json::to_vec(content)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}
