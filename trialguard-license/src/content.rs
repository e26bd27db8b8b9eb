//! License content carried inside a signed license key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An X.500 style distinguished name, e.g. `CN=Jane Doe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wraps an already formatted distinguished name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Builds `CN=<value>`, escaping the characters RFC 4514 reserves.
    pub fn common_name(value: &str) -> Self {
        let last = value.chars().count().saturating_sub(1);
        let mut escaped = String::with_capacity(value.len() + 3);
        escaped.push_str("CN=");
        for (i, c) in value.chars().enumerate() {
            let edge = (i == 0 && matches!(c, ' ' | '#')) || (i == last && c == ' ');
            if edge || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        Self(escaped)
    }

    /// Returns the distinguished name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The license payload. Everything except `consumer_amount` is optional
/// until the engine initializes it prior to signing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseContent {
    /// Licensing subject, usually the product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Licensee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<Principal>,
    /// Licensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Principal>,
    /// When the license was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
    /// Kind of consumer the license counts, e.g. `User`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_type: Option<String>,
    #[serde(default)]
    pub consumer_amount: u32,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl LicenseContent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_holder(mut self, holder: Principal) -> Self {
        self.holder = Some(holder);
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    #[must_use]
    pub fn with_not_after(mut self, not_after: DateTime<Utc>) -> Self {
        self.not_after = Some(not_after);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Returns true if `now` lies within `not_before..=not_after`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_none_or(|nb| nb <= now) && self.not_after.is_none_or(|na| now <= na)
    }
}
