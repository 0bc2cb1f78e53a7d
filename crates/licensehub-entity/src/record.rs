//! Server-side license row.

use chrono::{DateTime, Utc};
use licensehub_core::types::id::{LicenseId, ProductId};
use serde::{Deserialize, Serialize};

use crate::license::model::LicenseType;
use crate::license::status::LicenseStatus;

/// The persisted form of an issued license.
///
/// Variant-specific columns are optional; which of them are populated
/// follows from `license_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Unique license identifier, shared with the encoded envelope.
    pub id: LicenseId,
    /// License key the client presents.
    pub key: String,
    /// Variant discriminator.
    pub license_type: LicenseType,
    /// When the license was issued.
    pub issued_on: DateTime<Utc>,
    /// Optional expiry.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Issuing party.
    pub issuer: String,
    /// Lifecycle status.
    pub status: LicenseStatus,
    /// Who the license was issued to.
    pub issued_to: String,
    /// Seat cap (floating/concurrent only).
    pub max_active_users_count: Option<u32>,
    /// Current seat usage (floating/concurrent only).
    pub active_users_count: Option<u32>,
    /// Bound machine fingerprint (node-locked only).
    pub hardware_id: Option<String>,
    /// End of the current subscription window (subscription only).
    pub subscription_expiry_date: Option<DateTime<Utc>>,
    /// Product this license belongs to.
    pub product_id: ProductId,
}

impl LicenseRecord {
    /// Create an active license row with a fresh id.
    pub fn new(
        product_id: ProductId,
        license_type: LicenseType,
        key: impl Into<String>,
        issued_to: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            id: LicenseId::new(),
            key: key.into(),
            license_type,
            issued_on: Utc::now(),
            expiration_date: None,
            issuer: issuer.into(),
            status: LicenseStatus::Active,
            issued_to: issued_to.into(),
            max_active_users_count: None,
            active_users_count: None,
            hardware_id: None,
            subscription_expiry_date: None,
            product_id,
        }
    }

    /// Whether this row tracks per-machine activations.
    pub fn is_seat_counted(&self) -> bool {
        matches!(
            self.license_type,
            LicenseType::Floating | LicenseType::Concurrent
        )
    }

    /// Whether the persisted expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|e| e <= now)
    }
}
