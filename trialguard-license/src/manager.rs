//! License manager with a free trial period.
//!
//! [`TrialLicenseManager`] wraps a [`LicenseEngine`]. When the regular
//! license does not verify it falls back to the trial license:
//!
//! - a key is installed: verify it against the trial trust anchor;
//! - no key and the consumer is eligible: create, sign and install a trial
//!   license, then revoke eligibility and report the grant;
//! - otherwise fail with [`LicenseError::NoLicenseInstalled`].
//!
//! Every public operation holds one lock for its full duration, so a
//! verification that ends up issuing a trial license cannot interleave with
//! another verification or with a configuration change.

use crate::content::{LicenseContent, Principal};
use crate::engine::{ContentInitializer, LicenseEngine};
use crate::error::{ConfigError, LicenseError, LicenseResult};
use crate::key::SignedLicense;
use crate::notary::LicenseNotary;
use crate::params::{self, TrialLicenseParams};
use chrono::{DateTime, Days, Duration, Local, NaiveTime, TimeZone, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Role appended to the subject for holders of auto-issued trial licenses.
pub const TRIAL_USER_ROLE: &str = "Trial User";

/// Returns the expiry of a trial started at `now`: midnight of the current
/// day in `now`'s time zone plus `days`.
///
/// Returns `None` if the result falls outside of chrono's date range.
#[must_use]
pub fn trial_not_after<Tz: TimeZone>(now: DateTime<Tz>, days: u32) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let midnight = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(days)))?
        .and_time(NaiveTime::MIN);
    // Days starting with a DST gap begin at the first valid instant.
    midnight
        .and_local_timezone(tz.clone())
        .earliest()
        .or_else(|| (midnight + Duration::hours(1)).and_local_timezone(tz).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Returns the synthetic holder assigned to content without one.
#[must_use]
pub fn trial_holder(subject: &str) -> Principal {
    Principal::common_name(&format!("{subject} {TRIAL_USER_ROLE}"))
}

/// Assigns the trial holder to content that has none.
struct TrialHolder<'a> {
    subject: &'a str,
}

impl ContentInitializer for TrialHolder<'_> {
    fn initialize(&self, content: &mut LicenseContent) {
        if content.holder.is_none() {
            content.holder = Some(trial_holder(self.subject));
        }
    }
}

struct State {
    params: Arc<dyn TrialLicenseParams>,
    trial_notary: Option<Arc<dyn LicenseNotary>>,
}

/// Thread safe license manager adding a free trial period to a
/// [`LicenseEngine`].
pub struct TrialLicenseManager<E> {
    engine: E,
    state: Mutex<State>,
}

impl<E: LicenseEngine> TrialLicenseManager<E> {
    /// Creates a manager.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if `params` fail validation.
    pub fn new(engine: E, params: Arc<dyn TrialLicenseParams>) -> LicenseResult<Self> {
        params::validate(&*params)?;
        Ok(Self {
            engine,
            state: Mutex::new(State {
                params,
                trial_notary: None,
            }),
        })
    }

    /// Returns the wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the active parameters.
    pub fn params(&self) -> Arc<dyn TrialLicenseParams> {
        Arc::clone(&self.lock().params)
    }

    /// Replaces the parameters. On error the previous parameters stay active.
    ///
    /// The cached trial notary is dropped, so the next trial verification
    /// binds to the new trial trust anchor.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if `params` fail validation.
    pub fn set_params(&self, params: Arc<dyn TrialLicenseParams>) -> LicenseResult<()> {
        let mut state = self.lock();
        params::validate(&*params)?;
        info!(subject = %params.subject(), trial_days = params.trial_days(), "Applied license parameters");
        state.params = params;
        state.trial_notary = None;
        Ok(())
    }

    /// Verifies the installed license, falling back to the trial license
    /// and issuing one if the consumer is eligible.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::VerificationFailed`] if a key is installed but
    ///   neither trust anchor accepts it.
    /// - [`LicenseError::NoLicenseInstalled`] if no key is installed and the
    ///   consumer is not eligible for a trial.
    /// - [`LicenseError::IssuanceFailed`] if creating or installing the
    ///   trial license failed. No callback has run in that case.
    pub fn verify(&self) -> LicenseResult<LicenseContent> {
        let mut state = self.lock();
        let params = Arc::clone(&state.params);

        let primary_err = match self.engine.verify_primary(&*params) {
            Ok(content) => return Ok(content),
            Err(e) => e,
        };
        debug!(subject = %params.subject(), error = %primary_err, "Regular license rejected, checking trial license");

        if self.engine.installed_key()?.is_some() {
            return self
                .trial_notary(&mut state)
                .and_then(|notary| self.engine.verify(&*params, notary.as_ref()))
                .map_err(|e| {
                    debug!(subject = %params.subject(), error = %e, "Trial license rejected");
                    LicenseError::VerificationFailed
                });
        }

        if !params.is_eligible() {
            return Err(LicenseError::NoLicenseInstalled(params.subject().to_string()));
        }

        let installed = self
            .issue_trial(&mut state, &*params)
            .map_err(|e| LicenseError::IssuanceFailed(Box::new(e)))?;

        params.revoke_eligibility();
        params.on_granted(&installed);

        info!(
            subject = %params.subject(),
            not_after = ?installed.not_after,
            "Granted free trial period license"
        );
        Ok(installed)
    }

    /// Installs a regular license key supplied by the consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed, not signed by the regular
    /// trust anchor, fails validation, or cannot be stored.
    pub fn install(&self, key: &[u8]) -> LicenseResult<LicenseContent> {
        let state = self.lock();
        let params = Arc::clone(&state.params);
        let signed = SignedLicense::from_bytes(key)?;
        let notary = self.engine.notary(params.trust_anchor())?;
        self.engine.install(&*params, signed, notary.as_ref())
    }

    /// Removes the installed key. Eligibility is not restored.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the key store cannot remove the key.
    pub fn uninstall(&self) -> LicenseResult<()> {
        let _state = self.lock();
        self.engine.uninstall()
    }

    /// Assigns the trial holder to `content` if it has no holder.
    pub fn initialize(&self, content: &mut LicenseContent) {
        let state = self.lock();
        TrialHolder {
            subject: state.params.subject(),
        }
        .initialize(content);
    }

    /// Creates, signs and installs a trial license. Runs no host callback
    /// other than `create_trial_content`.
    fn issue_trial(
        &self,
        state: &mut State,
        params: &dyn TrialLicenseParams,
    ) -> LicenseResult<LicenseContent> {
        let notary = self.trial_notary(state)?;
        let not_after = trial_not_after(Local::now(), params.trial_days()).ok_or_else(|| {
            LicenseError::InvalidPayload("trial expiry out of range".to_string())
        })?;

        let mut content = params.create_trial_content();
        content.not_after = Some(not_after);

        let initializer = TrialHolder {
            subject: params.subject(),
        };
        let signed = self
            .engine
            .create(params, content, notary.as_ref(), &initializer)?;
        self.engine.install(params, signed, notary.as_ref())
    }

    fn trial_notary(&self, state: &mut State) -> LicenseResult<Arc<dyn LicenseNotary>> {
        if let Some(notary) = &state.trial_notary {
            return Ok(Arc::clone(notary));
        }
        let anchor = state
            .params
            .trial_trust_anchor()
            .ok_or(ConfigError::MissingField("trial_trust_anchor"))?;
        let notary = self.engine.notary(anchor)?;
        state.trial_notary = Some(Arc::clone(&notary));
        Ok(notary)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is replaced whole, never left half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
