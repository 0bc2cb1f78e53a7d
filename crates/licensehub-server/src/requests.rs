//! License generation requests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use licensehub_core::types::id::{FeatureId, ProductId};
use licensehub_core::types::time::opt_duration_secs;
use licensehub_entity::LicenseType;

/// One feature to attach to a generated license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGrant {
    /// Feature definition to grant.
    pub feature_id: FeatureId,
    /// Whether the grant starts enabled.
    pub enabled: bool,
}

/// Request to generate a new license.
///
/// Which optional fields are required depends on `license_type`; the
/// engine rejects requests missing the fields their variant needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Product the license belongs to.
    pub product_id: ProductId,
    /// Variant to issue.
    pub license_type: LicenseType,
    /// Who the license is issued to (the licensed user for standard,
    /// subscription, floating, and concurrent licenses).
    pub issued_to: String,
    /// Issuing party.
    pub issuer: String,
    /// Expiry for standard and node-locked licenses; must be in the
    /// future when present.
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Seat cap for floating/concurrent licenses.
    #[serde(default)]
    pub max_active_users_count: Option<u32>,
    /// Machine fingerprint for node-locked licenses.
    #[serde(default)]
    pub hardware_id: Option<String>,
    /// Subscription start; defaults to issue time.
    #[serde(default)]
    pub subscription_start_date: Option<DateTime<Utc>>,
    /// Subscription length.
    #[serde(default, with = "opt_duration_secs")]
    pub subscription_duration: Option<Duration>,
    /// Trial length.
    #[serde(default, with = "opt_duration_secs")]
    pub trial_period: Option<Duration>,
    /// Features to attach.
    #[serde(default)]
    pub features: Vec<FeatureGrant>,
}

impl GenerateRequest {
    /// Minimal request for the given variant.
    pub fn new(
        product_id: ProductId,
        license_type: LicenseType,
        issued_to: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            license_type,
            issued_to: issued_to.into(),
            issuer: issuer.into(),
            expiration_date: None,
            max_active_users_count: None,
            hardware_id: None,
            subscription_start_date: None,
            subscription_duration: None,
            trial_period: None,
            features: Vec::new(),
        }
    }
}
