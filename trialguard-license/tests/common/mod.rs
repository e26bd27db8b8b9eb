//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trialguard_license::{
    Ed25519Notary, Keyring, LicenseContent, LicenseError, LicenseKeyStore, LicenseNotary,
    LicenseParams, LicenseResult, MemoryKeyStore, NotaryProvider, Principal, SignedLicense,
    StandardLicenseEngine, TrialLicenseParams, TrustAnchorConfig,
};

pub const SUBJECT: &str = "acme-editor";

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair(seed_start: u8) -> (SigningKey, [u8; 32]) {
    let mut seed = [0u8; 32];
    for (i, b) in seed.iter_mut().enumerate() {
        *b = seed_start.wrapping_add(i as u8);
    }
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

pub fn primary_anchor() -> TrustAnchorConfig {
    TrustAnchorConfig::new("keys/public.ks", "regular").with_store_password("public-pass")
}

pub fn trial_anchor() -> TrustAnchorConfig {
    TrustAnchorConfig::new("keys/trial.ks", "trial")
        .with_store_password("trial-pass")
        .with_key_password("trial-key-pass")
}

pub fn primary_keypair() -> (SigningKey, [u8; 32]) {
    test_keypair(1)
}

pub fn trial_keypair() -> (SigningKey, [u8; 32]) {
    test_keypair(101)
}

/// Consumer-side keyring: verify-only regular anchor, signing trial anchor.
pub fn consumer_keyring() -> Keyring {
    let (_, primary_pk) = primary_keypair();
    let (trial_sk, _) = trial_keypair();
    Keyring::new()
        .with_verifying_key(primary_anchor(), primary_pk)
        .with_signing_key(trial_anchor(), trial_sk)
}

/// Counts how many notaries were built per anchor alias.
pub struct CountingProvider {
    inner: Keyring,
    built: Mutex<HashMap<String, usize>>,
}

impl CountingProvider {
    pub fn new(inner: Keyring) -> Self {
        Self {
            inner,
            built: Mutex::new(HashMap::new()),
        }
    }

    pub fn built(&self, alias: &str) -> usize {
        self.built.lock().unwrap().get(alias).copied().unwrap_or(0)
    }
}

impl NotaryProvider for CountingProvider {
    fn notary_for(&self, anchor: &TrustAnchorConfig) -> LicenseResult<Arc<dyn LicenseNotary>> {
        *self
            .built
            .lock()
            .unwrap()
            .entry(anchor.alias.clone())
            .or_default() += 1;
        self.inner.notary_for(anchor)
    }
}

pub fn engine_with(
    store: impl LicenseKeyStore + 'static,
    provider: Arc<dyn NotaryProvider>,
) -> StandardLicenseEngine {
    StandardLicenseEngine::new(store, provider)
}

pub fn memory_engine() -> StandardLicenseEngine {
    engine_with(MemoryKeyStore::new(), Arc::new(consumer_keyring()))
}

/// A fully initialized regular license for [`SUBJECT`].
pub fn regular_content() -> LicenseContent {
    LicenseContent {
        subject: Some(SUBJECT.to_string()),
        holder: Some(Principal::common_name("Jane Doe")),
        issuer: Some(Principal::common_name("ACME Inc.")),
        issued: Some(Utc::now() - Duration::days(1)),
        not_before: None,
        not_after: Some(Utc::now() + Duration::days(365)),
        consumer_type: Some("User".to_string()),
        consumer_amount: 1,
        info: Some("Annual subscription".to_string()),
        extra: None,
    }
}

/// Signs `content` the way the vendor would.
pub fn sign_with(key: &SigningKey, anchor: TrustAnchorConfig, content: &LicenseContent) -> SignedLicense {
    Ed25519Notary::with_signing_key(anchor, key.clone())
        .sign(content)
        .unwrap()
}

pub fn regular_key(content: &LicenseContent) -> Vec<u8> {
    let (sk, _) = primary_keypair();
    sign_with(&sk, primary_anchor(), content).to_bytes()
}

/// Key store whose writes always fail.
#[derive(Default)]
pub struct ReadOnlyKeyStore;

impl LicenseKeyStore for ReadOnlyKeyStore {
    fn load(&self) -> LicenseResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn save(&self, _key: &[u8]) -> LicenseResult<()> {
        Err(LicenseError::Storage("read-only store".to_string()))
    }

    fn remove(&self) -> LicenseResult<()> {
        Ok(())
    }
}

/// Host parameters recording every callback.
pub struct RecordingParams {
    pub subject: String,
    pub anchor: TrustAnchorConfig,
    pub trial_anchor: Option<TrustAnchorConfig>,
    pub days: u32,
    pub factory_not_after: Option<DateTime<Utc>>,
    pub eligible: AtomicBool,
    pub creates: AtomicUsize,
    pub revokes: AtomicUsize,
    pub granted: Mutex<Vec<LicenseContent>>,
}

impl RecordingParams {
    pub fn new(eligible: bool) -> Self {
        Self {
            subject: SUBJECT.to_string(),
            anchor: primary_anchor(),
            trial_anchor: Some(trial_anchor()),
            days: 30,
            factory_not_after: None,
            eligible: AtomicBool::new(eligible),
            creates: AtomicUsize::new(0),
            revokes: AtomicUsize::new(0),
            granted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn with_trial_anchor(mut self, anchor: Option<TrustAnchorConfig>) -> Self {
        self.trial_anchor = anchor;
        self
    }

    pub fn with_factory_not_after(mut self, not_after: DateTime<Utc>) -> Self {
        self.factory_not_after = Some(not_after);
        self
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn revokes(&self) -> usize {
        self.revokes.load(Ordering::SeqCst)
    }

    pub fn granted(&self) -> Vec<LicenseContent> {
        self.granted.lock().unwrap().clone()
    }
}

impl LicenseParams for RecordingParams {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn trust_anchor(&self) -> &TrustAnchorConfig {
        &self.anchor
    }
}

impl TrialLicenseParams for RecordingParams {
    fn trial_trust_anchor(&self) -> Option<&TrustAnchorConfig> {
        self.trial_anchor.as_ref()
    }

    fn trial_days(&self) -> u32 {
        self.days
    }

    fn is_eligible(&self) -> bool {
        self.eligible.load(Ordering::SeqCst)
    }

    fn create_trial_content(&self) -> LicenseContent {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut content = LicenseContent::new().with_info("Evaluation");
        content.not_after = self.factory_not_after;
        content
    }

    fn revoke_eligibility(&self) {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        self.eligible.store(false, Ordering::SeqCst);
    }

    fn on_granted(&self, content: &LicenseContent) {
        self.granted.lock().unwrap().push(content.clone());
    }
}
