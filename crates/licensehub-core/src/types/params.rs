//! Validation parameters supplied by callers or derived from a license.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::time::opt_duration_secs;

/// Parameters a license is validated against.
///
/// Callers may supply these explicitly; when omitted, the client manager
/// derives them from the loaded license variant. All fields are optional
/// because each variant's rule group consults only the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationParams {
    /// Expected licensed user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Expected license key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
    /// Hardware identifier of the requesting machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
    /// Expected seat cap for floating/concurrent licenses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_active_users_count: Option<u32>,
    /// Subscription start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<DateTime<Utc>>,
    /// Subscription duration.
    #[serde(default, with = "opt_duration_secs", skip_serializing_if = "Option::is_none")]
    pub subscription_duration: Option<Duration>,
    /// Trial period.
    #[serde(default, with = "opt_duration_secs", skip_serializing_if = "Option::is_none")]
    pub trial_period: Option<Duration>,
}

impl ValidationParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected user name.
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Set the expected license key.
    pub fn with_license_key(mut self, license_key: impl Into<String>) -> Self {
        self.license_key = Some(license_key.into());
        self
    }

    /// Set the hardware identifier.
    pub fn with_hardware_id(mut self, hardware_id: impl Into<String>) -> Self {
        self.hardware_id = Some(hardware_id.into());
        self
    }

    /// Set the expected seat cap.
    pub fn with_max_active_users_count(mut self, count: u32) -> Self {
        self.max_active_users_count = Some(count);
        self
    }
}
