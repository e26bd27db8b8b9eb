//! The regular license pipeline: create, install and verify signed keys.
//!
//! [`LicenseEngine`] is the seam the trial manager builds on.
//! [`StandardLicenseEngine`] implements it over a [`LicenseKeyStore`] and a
//! [`NotaryProvider`].

use crate::anchor::TrustAnchorConfig;
use crate::content::{LicenseContent, Principal};
use crate::error::{LicenseError, LicenseResult};
use crate::key::SignedLicense;
use crate::notary::{LicenseNotary, NotaryProvider};
use crate::params::LicenseParams;
use crate::store::LicenseKeyStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Default holder when nothing else provided one.
pub const DEFAULT_HOLDER: &str = "Unknown User";

/// Default consumer type.
pub const DEFAULT_CONSUMER_TYPE: &str = "User";

/// Hook run on content before the engine applies its own defaults and signs.
pub trait ContentInitializer {
    fn initialize(&self, content: &mut LicenseContent);
}

/// Initializer that leaves content untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInitializer;

impl ContentInitializer for NoopInitializer {
    fn initialize(&self, _content: &mut LicenseContent) {}
}

/// Regular license pipeline consumed by the trial manager.
pub trait LicenseEngine: Send + Sync {
    /// Returns a notary bound to `anchor`.
    fn notary(&self, anchor: &TrustAnchorConfig) -> LicenseResult<Arc<dyn LicenseNotary>>;

    /// Verifies the installed key with `notary`.
    fn verify(
        &self,
        params: &dyn LicenseParams,
        notary: &dyn LicenseNotary,
    ) -> LicenseResult<LicenseContent>;

    /// Initializes, validates and signs `content`.
    fn create(
        &self,
        params: &dyn LicenseParams,
        content: LicenseContent,
        notary: &dyn LicenseNotary,
        initializer: &dyn ContentInitializer,
    ) -> LicenseResult<SignedLicense>;

    /// Verifies `signed`, makes it the installed key and returns a fresh
    /// copy of its content.
    fn install(
        &self,
        params: &dyn LicenseParams,
        signed: SignedLicense,
        notary: &dyn LicenseNotary,
    ) -> LicenseResult<LicenseContent>;

    /// Returns the raw installed key, valid or not.
    fn installed_key(&self) -> LicenseResult<Option<Vec<u8>>>;

    /// Removes the installed key.
    fn uninstall(&self) -> LicenseResult<()>;

    /// Verifies the installed key against the regular trust anchor.
    fn verify_primary(&self, params: &dyn LicenseParams) -> LicenseResult<LicenseContent> {
        let notary = self.notary(params.trust_anchor())?;
        self.verify(params, notary.as_ref())
    }
}

/// Reference engine backed by a key store and a notary provider.
pub struct StandardLicenseEngine {
    store: Box<dyn LicenseKeyStore>,
    notaries: Arc<dyn NotaryProvider>,
}

impl StandardLicenseEngine {
    pub fn new(store: impl LicenseKeyStore + 'static, notaries: Arc<dyn NotaryProvider>) -> Self {
        Self {
            store: Box::new(store),
            notaries,
        }
    }

    /// Fills in everything `initializer` left unset.
    fn apply_defaults(
        params: &dyn LicenseParams,
        content: &mut LicenseContent,
        notary: &dyn LicenseNotary,
        now: DateTime<Utc>,
    ) {
        content.subject.get_or_insert_with(|| params.subject().to_string());
        content.issued.get_or_insert(now);
        content
            .issuer
            .get_or_insert_with(|| Principal::common_name(&notary.trust_anchor().alias));
        content
            .holder
            .get_or_insert_with(|| Principal::common_name(DEFAULT_HOLDER));
        content
            .consumer_type
            .get_or_insert_with(|| DEFAULT_CONSUMER_TYPE.to_string());
        if content.consumer_amount == 0 {
            content.consumer_amount = 1;
        }
    }
}

/// Checks a decoded or freshly initialized content against `params` at `now`.
pub fn validate_content(
    params: &dyn LicenseParams,
    content: &LicenseContent,
    now: DateTime<Utc>,
) -> LicenseResult<()> {
    let subject = content.subject.as_deref().unwrap_or_default();
    if subject != params.subject() {
        return Err(LicenseError::InvalidSubject {
            expected: params.subject().to_string(),
            found: subject.to_string(),
        });
    }
    if content.holder.is_none() {
        return Err(LicenseError::InvalidPayload("missing holder".to_string()));
    }
    if content.issuer.is_none() {
        return Err(LicenseError::InvalidPayload("missing issuer".to_string()));
    }
    if content.issued.is_none() {
        return Err(LicenseError::InvalidPayload("missing issue date".to_string()));
    }
    if content.consumer_type.is_none() {
        return Err(LicenseError::InvalidPayload("missing consumer type".to_string()));
    }
    if content.consumer_amount == 0 {
        return Err(LicenseError::InvalidPayload(
            "consumer amount must be positive".to_string(),
        ));
    }
    if let Some(not_before) = content.not_before
        && now < not_before
    {
        return Err(LicenseError::NotYetValid(not_before.to_rfc3339()));
    }
    if let Some(not_after) = content.not_after
        && now > not_after
    {
        return Err(LicenseError::Expired(not_after.to_rfc3339()));
    }
    Ok(())
}

impl LicenseEngine for StandardLicenseEngine {
    fn notary(&self, anchor: &TrustAnchorConfig) -> LicenseResult<Arc<dyn LicenseNotary>> {
        self.notaries.notary_for(anchor)
    }

    fn verify(
        &self,
        params: &dyn LicenseParams,
        notary: &dyn LicenseNotary,
    ) -> LicenseResult<LicenseContent> {
        let key = self
            .store
            .load()?
            .ok_or_else(|| LicenseError::NoLicenseInstalled(params.subject().to_string()))?;
        let signed = SignedLicense::from_bytes(&key)?;
        let content = notary.verify(&signed)?;
        validate_content(params, &content, Utc::now())?;
        Ok(content)
    }

    fn create(
        &self,
        params: &dyn LicenseParams,
        mut content: LicenseContent,
        notary: &dyn LicenseNotary,
        initializer: &dyn ContentInitializer,
    ) -> LicenseResult<SignedLicense> {
        let now = Utc::now();
        initializer.initialize(&mut content);
        Self::apply_defaults(params, &mut content, notary, now);
        validate_content(params, &content, now)?;
        notary.sign(&content)
    }

    fn install(
        &self,
        params: &dyn LicenseParams,
        signed: SignedLicense,
        notary: &dyn LicenseNotary,
    ) -> LicenseResult<LicenseContent> {
        let content = notary.verify(&signed)?;
        validate_content(params, &content, Utc::now())?;
        self.store.save(&signed.to_bytes())?;
        debug!(
            subject = %params.subject(),
            anchor = %notary.trust_anchor().fingerprint(),
            "Installed license key"
        );
        Ok(content)
    }

    fn installed_key(&self) -> LicenseResult<Option<Vec<u8>>> {
        self.store.load()
    }

    fn uninstall(&self) -> LicenseResult<()> {
        self.store.remove()
    }
}
