//! License record and the derived-status rules.
//!
//! A license's status is never stored: it is computed from `is_active`,
//! `expires_at` and the caller's notion of "now".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LicenseError;

/// Kind of license, which fixes its validity period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Month,
    Year,
    Lifetime,
}

impl LicenseType {
    pub const ALL: [Self; 3] = [Self::Month, Self::Year, Self::Lifetime];

    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
            Self::Lifetime => "lifetime",
        }
    }

    /// Human-readable name shown to operators.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Year => "Year",
            Self::Lifetime => "Lifetime",
        }
    }

    /// Validity period in days; `None` never expires.
    pub const fn validity_days(self) -> Option<i64> {
        match self {
            Self::Month => Some(30),
            Self::Year => Some(365),
            Self::Lifetime => None,
        }
    }

    /// Expiry of a license of this type created at `created_at`.
    pub fn expires_at(self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.validity_days()
            .map(|days| created_at + TimeDelta::days(days))
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseType {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LicenseError::InvalidArgument(format!("unknown license type '{s}'")))
    }
}

/// Derived status of a license at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Banned,
    Expired,
}

/// Why a license failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidReason {
    Banned,
    Expired,
    /// Fallback when neither flag explains the failure.
    Invalid,
}

impl InvalidReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Banned => "banned",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
        }
    }
}

/// A stored license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    pub key: String,
    pub license_type: LicenseType,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Result of the lenient validation check: flags plus a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub banned: bool,
    pub expired: bool,
    pub license_type: LicenseType,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<InvalidReason>,
}

/// Result of the strict verification check for a usable license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub license_type: LicenseType,
    /// Whole days remaining, `None` for non-expiring licenses.
    pub days_left: Option<i64>,
}

impl License {
    /// A fresh, active license of `license_type` created at `created_at`.
    pub fn new(key: String, license_type: LicenseType, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            license_type,
            created_at,
            expires_at: license_type.expires_at(created_at),
            is_active: true,
        }
    }

    pub const fn is_banned(&self) -> bool {
        !self.is_active
    }

    /// Strictly past expiry; a license expiring exactly at `now` is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }

    /// Banned takes precedence over expired.
    pub fn status(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.is_banned() {
            LicenseStatus::Banned
        } else if self.is_expired(now) {
            LicenseStatus::Expired
        } else {
            LicenseStatus::Active
        }
    }

    /// Whole days until expiry, rounded down; `None` if the license never expires.
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|expires| (expires - now).num_days().max(0))
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Validation {
        let banned = self.is_banned();
        let expired = self.is_expired(now);
        let valid = self.is_active && !expired;
        let reason = if valid {
            None
        } else if banned {
            Some(InvalidReason::Banned)
        } else if expired {
            Some(InvalidReason::Expired)
        } else {
            Some(InvalidReason::Invalid)
        };

        Validation {
            valid,
            banned,
            expired,
            license_type: self.license_type,
            expires_at: self.expires_at,
            reason,
        }
    }

    pub fn verify(&self, now: DateTime<Utc>) -> Result<Verification, LicenseError> {
        match self.status(now) {
            LicenseStatus::Banned => Err(LicenseError::Banned),
            LicenseStatus::Expired => Err(LicenseError::Expired),
            LicenseStatus::Active => Ok(Verification {
                license_type: self.license_type,
                days_left: self.days_left(now),
            }),
        }
    }
}
