//! The license sum type and its six variants.
//!
//! Serialized form is internally tagged on `"Type"` with the variant name
//! as discriminator. Base fields are flattened into the variant object so
//! the payload stays a single flat JSON map. Feature keys live in a
//! `BTreeMap` and timestamps serialize as RFC 3339, which keeps envelopes
//! byte-stable across platforms.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use licensehub_core::error::AppError;
use licensehub_core::types::id::LicenseId;
use licensehub_core::types::time::duration_secs;
use licensehub_core::AppResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feature::FeatureValue;

/// Discriminator for the six license shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseType {
    Standard,
    Trial,
    NodeLocked,
    Subscription,
    Floating,
    Concurrent,
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "Standard",
            Self::Trial => "Trial",
            Self::NodeLocked => "NodeLocked",
            Self::Subscription => "Subscription",
            Self::Floating => "Floating",
            Self::Concurrent => "Concurrent",
        };
        write!(f, "{name}")
    }
}

/// Attributes common to every license variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// Immutable license identifier, generated at construction.
    pub license_id: LicenseId,
    /// Opaque license key; defaults to a fresh UUID, caller-settable
    /// before the license is saved.
    pub license_key: String,
    /// When the license was issued. Set at construction, immutable.
    pub issued_on: DateTime<Utc>,
    /// Optional expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Issuing party.
    pub issuer: String,
    /// Feature map; keys are case-sensitive and matched exactly.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
}

impl LicenseInfo {
    /// Create base attributes with a fresh id and key.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            license_id: LicenseId::new(),
            license_key: Uuid::new_v4().to_string(),
            issued_on: Utc::now(),
            expiration_date: None,
            issuer: issuer.into(),
            features: BTreeMap::new(),
        }
    }
}

/// A personal license bound to a user name and key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// Licensed user.
    pub user_name: String,
}

/// A time-boxed evaluation license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// Evaluation window, counted from `issued_on`.
    #[serde(with = "duration_secs")]
    pub trial_period: Duration,
}

/// A license bound to one machine fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLockedLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// Fingerprint of the licensed machine.
    pub hardware_id: String,
}

/// A subscription running from a start date for a fixed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// Subscriber.
    pub user_name: String,
    /// Start of the subscription window.
    pub subscription_start_date: DateTime<Utc>,
    /// Length of the subscription window.
    #[serde(with = "duration_secs")]
    pub subscription_duration: Duration,
}

/// A seat-counted license for named-host pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// License owner.
    pub user_name: String,
    /// Seat cap.
    pub max_active_users_count: u32,
}

/// A seat-counted license with heartbeat-tracked activations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrentLicense {
    #[serde(flatten)]
    pub info: LicenseInfo,
    /// License owner.
    pub user_name: String,
    /// Seat cap.
    pub max_active_users_count: u32,
}

/// The tagged sum of all license shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum License {
    Standard(StandardLicense),
    Trial(TrialLicense),
    NodeLocked(NodeLockedLicense),
    Subscription(SubscriptionLicense),
    Floating(FloatingLicense),
    Concurrent(ConcurrentLicense),
}

impl StandardLicense {
    /// Create a standard license for `user_name`.
    pub fn new(issuer: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            info: LicenseInfo::new(issuer),
            user_name: user_name.into(),
        }
    }
}

impl TrialLicense {
    /// Create a trial license.
    ///
    /// The expiry is fixed to `issued_on + trial_period` at construction
    /// and cannot be overridden afterwards.
    pub fn new(issuer: impl Into<String>, trial_period: Duration) -> Self {
        let mut info = LicenseInfo::new(issuer);
        info.expiration_date = Some(info.issued_on + trial_period);
        Self { info, trial_period }
    }
}

impl NodeLockedLicense {
    /// Create a node-locked license for a machine fingerprint.
    pub fn new(issuer: impl Into<String>, hardware_id: impl Into<String>) -> Self {
        Self {
            info: LicenseInfo::new(issuer),
            hardware_id: hardware_id.into(),
        }
    }
}

impl SubscriptionLicense {
    /// Create a subscription starting at `start` for `duration`.
    ///
    /// The expiry is fixed to `start + duration`.
    pub fn new(
        issuer: impl Into<String>,
        user_name: impl Into<String>,
        start: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        let mut info = LicenseInfo::new(issuer);
        info.expiration_date = Some(start + duration);
        Self {
            info,
            user_name: user_name.into(),
            subscription_start_date: start,
            subscription_duration: duration,
        }
    }
}

impl FloatingLicense {
    /// Create a floating license with `max_active_users_count` seats.
    pub fn new(
        issuer: impl Into<String>,
        user_name: impl Into<String>,
        max_active_users_count: u32,
    ) -> Self {
        Self {
            info: LicenseInfo::new(issuer),
            user_name: user_name.into(),
            max_active_users_count,
        }
    }
}

impl ConcurrentLicense {
    /// Create a concurrent license with `max_active_users_count` seats.
    pub fn new(
        issuer: impl Into<String>,
        user_name: impl Into<String>,
        max_active_users_count: u32,
    ) -> Self {
        Self {
            info: LicenseInfo::new(issuer),
            user_name: user_name.into(),
            max_active_users_count,
        }
    }
}

impl License {
    /// The variant discriminator.
    ///
    /// A concurrent license always reports `Concurrent`, regardless of how
    /// the value was assembled.
    pub fn license_type(&self) -> LicenseType {
        match self {
            Self::Standard(_) => LicenseType::Standard,
            Self::Trial(_) => LicenseType::Trial,
            Self::NodeLocked(_) => LicenseType::NodeLocked,
            Self::Subscription(_) => LicenseType::Subscription,
            Self::Floating(_) => LicenseType::Floating,
            Self::Concurrent(_) => LicenseType::Concurrent,
        }
    }

    /// Shared base attributes.
    pub fn info(&self) -> &LicenseInfo {
        match self {
            Self::Standard(l) => &l.info,
            Self::Trial(l) => &l.info,
            Self::NodeLocked(l) => &l.info,
            Self::Subscription(l) => &l.info,
            Self::Floating(l) => &l.info,
            Self::Concurrent(l) => &l.info,
        }
    }

    fn info_mut(&mut self) -> &mut LicenseInfo {
        match self {
            Self::Standard(l) => &mut l.info,
            Self::Trial(l) => &mut l.info,
            Self::NodeLocked(l) => &mut l.info,
            Self::Subscription(l) => &mut l.info,
            Self::Floating(l) => &mut l.info,
            Self::Concurrent(l) => &mut l.info,
        }
    }

    /// The license key.
    pub fn license_key(&self) -> &str {
        &self.info().license_key
    }

    /// Replace the license key before saving.
    pub fn with_license_key(mut self, key: impl Into<String>) -> Self {
        self.info_mut().license_key = key.into();
        self
    }

    /// Add a feature value.
    pub fn with_feature(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.info_mut().features.insert(name.into(), value);
        self
    }

    /// Set or clear the expiry.
    ///
    /// Trial and subscription licenses derive their expiry from their
    /// window fields at construction; overriding it would break that
    /// relationship, so the call is rejected for those variants.
    pub fn set_expiration(&mut self, expiration: Option<DateTime<Utc>>) -> AppResult<()> {
        match self {
            Self::Trial(_) => Err(AppError::bad_request(
                "trial expiry is fixed to issued_on + trial_period",
            )),
            Self::Subscription(_) => Err(AppError::bad_request(
                "subscription expiry is fixed to start + duration",
            )),
            _ => {
                self.info_mut().expiration_date = expiration;
                Ok(())
            }
        }
    }

    /// Licensed user name, where the variant has one.
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Self::Standard(l) => Some(&l.user_name),
            Self::Subscription(l) => Some(&l.user_name),
            Self::Floating(l) => Some(&l.user_name),
            Self::Concurrent(l) => Some(&l.user_name),
            Self::Trial(_) | Self::NodeLocked(_) => None,
        }
    }

    /// Machine fingerprint, for node-locked licenses.
    pub fn hardware_id(&self) -> Option<&str> {
        match self {
            Self::NodeLocked(l) => Some(&l.hardware_id),
            _ => None,
        }
    }

    /// Seat cap, for floating and concurrent licenses.
    pub fn max_active_users_count(&self) -> Option<u32> {
        match self {
            Self::Floating(l) => Some(l.max_active_users_count),
            Self::Concurrent(l) => Some(l.max_active_users_count),
            _ => None,
        }
    }

    /// Whether this variant consumes server-side seats.
    pub fn is_seat_counted(&self) -> bool {
        matches!(self, Self::Floating(_) | Self::Concurrent(_))
    }
}
