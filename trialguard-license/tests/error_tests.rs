use std::error::Error;
use trialguard_license::{ConfigError, LicenseError};

#[test]
fn error_display_config() {
    let err = LicenseError::from(ConfigError::DuplicateTrustAnchor);
    let msg = format!("{err}");
    assert!(msg.contains("invalid license configuration"));
    assert!(msg.contains("equal trust anchors"));
}

#[test]
fn error_display_invalid_duration() {
    let err = ConfigError::InvalidDuration(400);
    assert!(format!("{err}").contains("400"));
}

#[test]
fn error_display_missing_field() {
    let err = ConfigError::MissingField("trial_trust_anchor");
    assert!(format!("{err}").contains("trial_trust_anchor"));
}

#[test]
fn error_display_no_license() {
    let err = LicenseError::NoLicenseInstalled("acme-editor".into());
    let msg = format!("{err}");
    assert!(msg.contains("no license installed"));
    assert!(msg.contains("acme-editor"));
}

#[test]
fn error_display_verification_failed() {
    let err = LicenseError::VerificationFailed;
    assert_eq!(format!("{err}"), "license verification failed");
}

#[test]
fn issuance_failed_keeps_source() {
    let err = LicenseError::IssuanceFailed(Box::new(LicenseError::Storage("disk full".into())));
    assert!(format!("{err}").contains("disk full"));
    let source = err.source().unwrap();
    assert!(format!("{source}").contains("storage error"));
}

#[test]
fn error_display_invalid_subject() {
    let err = LicenseError::InvalidSubject {
        expected: "a".into(),
        found: "b".into(),
    };
    let msg = format!("{err}");
    assert!(msg.contains("'a'"));
    assert!(msg.contains("'b'"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let license_err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{license_err}").contains("serialization"));
}
