//! The license record and its canonical serialization.
//!
//! Field order on the wire is fixed: `id, major, minor, patch, user,
//! created, validTo, expire`. Instants are written as
//! `YYYY-MM-DDTHH:MM:SS.sssZ`; absent instants are `null`.

use crate::error::{LicenseError, LicenseResult};
use crate::expiry::parse_absolute_date;
use crate::ids::LicenseId;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Wildcard accepted for any version component.
pub const WILDCARD: &str = "*";

/// Caller-supplied license terms, before time resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseTerms {
    pub major: String,
    pub minor: String,
    pub patch: String,
    /// License holder, typically an email address.
    pub user: String,
    /// Relative expiry spec (`days-30`), resolved into `validTo`.
    pub valid_to: Option<String>,
    /// Absolute expiry date, parsed into `expire`.
    pub expire: Option<String>,
}

impl LicenseTerms {
    /// Terms for `user` matching any version, with no expiry.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            major: WILDCARD.to_string(),
            minor: WILDCARD.to_string(),
            patch: WILDCARD.to_string(),
            user: user.into(),
            valid_to: None,
            expire: None,
        }
    }

    /// Sets the version constraint. Empty components fall back to `*`.
    #[must_use]
    pub fn with_version(
        mut self,
        major: impl Into<String>,
        minor: impl Into<String>,
        patch: impl Into<String>,
    ) -> Self {
        self.major = version_component(Some(major.into()));
        self.minor = version_component(Some(minor.into()));
        self.patch = version_component(Some(patch.into()));
        self
    }

    #[must_use]
    pub fn with_valid_to(mut self, spec: impl Into<String>) -> Self {
        self.valid_to = Some(spec.into());
        self
    }

    #[must_use]
    pub fn with_expire(mut self, date: impl Into<String>) -> Self {
        self.expire = Some(date.into());
        self
    }

    /// Rejects terms without a license holder.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.user.is_empty() {
            return Err(LicenseError::Validation(
                "a license holder (--user) is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalizes one version component: missing or empty becomes `*`.
#[must_use]
pub fn version_component(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => WILDCARD.to_string(),
    }
}

/// An issued license, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    id: LicenseId,
    major: String,
    minor: String,
    patch: String,
    user: String,
    #[serde(with = "iso_millis")]
    created: DateTime<Utc>,
    #[serde(with = "iso_millis::option")]
    valid_to: Option<DateTime<Utc>>,
    #[serde(with = "iso_millis::option")]
    expire: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    /// Assembles a record from terms and already-resolved inputs.
    ///
    /// `valid_to` must already be resolved against `now`. The terms' `expire`
    /// string is parsed here, at millisecond precision; an unparseable date
    /// becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Validation`] if the user is empty.
    pub fn build(
        id: LicenseId,
        terms: &LicenseTerms,
        now: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> LicenseResult<Self> {
        terms.validate()?;

        let expire = match terms.expire.as_deref().filter(|s| !s.is_empty()) {
            Some(input) => {
                let parsed = parse_absolute_date(input)
                    .map(|date| date.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(date));
                if parsed.is_none() {
                    tracing::warn!(input, "unparseable expire date, license will carry no expire");
                }
                parsed
            }
            None => None,
        };

        Ok(Self {
            id,
            major: terms.major.clone(),
            minor: terms.minor.clone(),
            patch: terms.patch.clone(),
            user: terms.user.clone(),
            created: now,
            valid_to,
            expire,
        })
    }

    /// Serializes the record to its canonical JSON bytes.
    pub fn to_canonical_bytes(&self) -> LicenseResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses canonical JSON bytes back into a record.
    pub fn from_canonical_bytes(bytes: &[u8]) -> LicenseResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    #[must_use]
    pub fn id(&self) -> LicenseId {
        self.id
    }

    #[must_use]
    pub fn major(&self) -> &str {
        &self.major
    }

    #[must_use]
    pub fn minor(&self) -> &str {
        &self.minor
    }

    #[must_use]
    pub fn patch(&self) -> &str {
        &self.patch
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    #[must_use]
    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    #[must_use]
    pub fn expire(&self) -> Option<DateTime<Utc>> {
        self.expire
    }
}

/// `DateTime<Utc>` as an RFC 3339 string with millisecond precision and `Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(instant) => super::serialize(instant, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
