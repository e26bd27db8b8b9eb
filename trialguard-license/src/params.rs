//! License parameters supplied by the host application.

use crate::anchor::TrustAnchorConfig;
use crate::content::LicenseContent;
use crate::error::ConfigError;
use crate::settings::TrialSettings;
use crate::store::EligibilityStore;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Longest accepted trial period.
pub const MAX_TRIAL_DAYS: u32 = 365;

/// Default `info` of trial licenses created by [`TrialParams`].
pub const TRIAL_CONTENT_INFO: &str = "Free trial period license";

/// Parameters of the regular license pipeline.
pub trait LicenseParams: Send + Sync {
    /// Licensing subject, usually the product name.
    fn subject(&self) -> &str;

    /// Trust anchor of regular licenses.
    fn trust_anchor(&self) -> &TrustAnchorConfig;
}

/// Additional parameters for the free trial period.
///
/// The callbacks run while the license manager holds its lock, so they must
/// not call back into the manager.
pub trait TrialLicenseParams: LicenseParams {
    /// Trust anchor of trial licenses; must differ from [`LicenseParams::trust_anchor`].
    fn trial_trust_anchor(&self) -> Option<&TrustAnchorConfig>;

    /// Length of the trial period in days, `1..=365`.
    fn trial_days(&self) -> u32;

    /// Whether the consumer may still receive a trial license.
    fn is_eligible(&self) -> bool;

    /// Returns fresh content for a trial license. Subject and expiry are
    /// filled in afterwards.
    fn create_trial_content(&self) -> LicenseContent;

    /// Called once a trial license has been installed.
    fn revoke_eligibility(&self);

    /// Called with the installed trial content after eligibility was revoked.
    fn on_granted(&self, content: &LicenseContent);
}

/// Checks `params` before they are applied.
///
/// # Errors
///
/// Returns the first violated rule: missing trial anchor, trial anchor equal
/// to the regular anchor, or a duration outside `1..=365` days.
pub fn validate(params: &dyn TrialLicenseParams) -> Result<(), ConfigError> {
    let trial_anchor = params
        .trial_trust_anchor()
        .ok_or(ConfigError::MissingField("trial_trust_anchor"))?;
    if trial_anchor == params.trust_anchor() {
        return Err(ConfigError::DuplicateTrustAnchor);
    }
    let days = params.trial_days();
    if days == 0 || days > MAX_TRIAL_DAYS {
        return Err(ConfigError::InvalidDuration(days));
    }
    Ok(())
}

type GrantHook = Box<dyn Fn(&LicenseContent) + Send + Sync>;

/// Ready-made [`TrialLicenseParams`] backed by an [`EligibilityStore`].
pub struct TrialParams {
    subject: String,
    trust_anchor: TrustAnchorConfig,
    trial_trust_anchor: Option<TrustAnchorConfig>,
    trial_days: u32,
    eligibility: Arc<dyn EligibilityStore>,
    on_granted: Option<GrantHook>,
}

impl TrialParams {
    pub fn new(
        subject: impl Into<String>,
        trust_anchor: TrustAnchorConfig,
        trial_trust_anchor: TrustAnchorConfig,
        trial_days: u32,
        eligibility: Arc<dyn EligibilityStore>,
    ) -> Self {
        Self {
            subject: subject.into(),
            trust_anchor,
            trial_trust_anchor: Some(trial_trust_anchor),
            trial_days,
            eligibility,
            on_granted: None,
        }
    }

    /// Builds parameters from a settings file.
    pub fn from_settings(settings: TrialSettings, eligibility: Arc<dyn EligibilityStore>) -> Self {
        Self {
            subject: settings.subject,
            trust_anchor: settings.trust_anchor,
            trial_trust_anchor: settings.trial_trust_anchor,
            trial_days: settings.trial_days,
            eligibility,
            on_granted: None,
        }
    }

    /// Registers a callback invoked when a trial license is granted.
    #[must_use]
    pub fn with_grant_hook(mut self, hook: impl Fn(&LicenseContent) + Send + Sync + 'static) -> Self {
        self.on_granted = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for TrialParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrialParams")
            .field("subject", &self.subject)
            .field("trust_anchor", &self.trust_anchor)
            .field("trial_trust_anchor", &self.trial_trust_anchor)
            .field("trial_days", &self.trial_days)
            .finish_non_exhaustive()
    }
}

impl LicenseParams for TrialParams {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn trust_anchor(&self) -> &TrustAnchorConfig {
        &self.trust_anchor
    }
}

impl TrialLicenseParams for TrialParams {
    fn trial_trust_anchor(&self) -> Option<&TrustAnchorConfig> {
        self.trial_trust_anchor.as_ref()
    }

    fn trial_days(&self) -> u32 {
        self.trial_days
    }

    fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }

    fn create_trial_content(&self) -> LicenseContent {
        LicenseContent::new().with_info(TRIAL_CONTENT_INFO)
    }

    fn revoke_eligibility(&self) {
        // Later verifications find the installed key before asking again.
        if let Err(e) = self.eligibility.revoke() {
            warn!(subject = %self.subject, "Failed to persist trial eligibility: {}", e);
        }
    }

    fn on_granted(&self, content: &LicenseContent) {
        if let Some(hook) = &self.on_granted {
            hook(content);
        }
    }
}
