//! The activation engine.
//!
//! Every mutating operation acquires the per-license row lock from the
//! store before its read-modify-write, so concurrent activations of the
//! same license serialize and the seat counter can never overshoot the
//! cap.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use licensehub_codec::LicenseCodec;
use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::types::id::{LicenseId, ProductId};
use licensehub_core::types::params::ValidationParams;
use licensehub_core::AppResult;
use licensehub_crypto::{hash, LicensingSecrets};
use licensehub_entity::{
    Activation, ConcurrentLicense, FeatureValue, FloatingLicense, License, LicenseFeature,
    LicenseInfo, LicenseRecord, LicenseStatus, LicenseType, NodeLockedLicense, StandardLicense,
    SubscriptionLicense, TrialLicense,
};

use crate::requests::GenerateRequest;
use crate::results::{ActivationResult, DeactivationResult, RenewalResult, ValidationResult};
use crate::store::LicenseStore;

/// Server-side license engine: generate, validate, activate, revoke,
/// renew, and heartbeat, with seat accounting for floating and concurrent
/// licenses.
///
/// Thread-safe; share across workers via `Arc<ActivationEngine>`.
#[derive(Clone)]
pub struct ActivationEngine {
    store: Arc<dyn LicenseStore>,
    secrets: Arc<LicensingSecrets>,
    codec: LicenseCodec,
}

impl std::fmt::Debug for ActivationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationEngine").finish()
    }
}

impl ActivationEngine {
    /// Create an engine over a store and licensing secrets.
    pub fn new(store: Arc<dyn LicenseStore>, secrets: Arc<LicensingSecrets>) -> Self {
        Self {
            store,
            secrets,
            codec: LicenseCodec::default(),
        }
    }

    /// Replace the envelope codec (custom serializer).
    pub fn with_codec(mut self, codec: LicenseCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Generate a new license and return its encoded envelope.
    pub async fn generate(&self, request: GenerateRequest) -> AppResult<Vec<u8>> {
        if !self.store.product_exists(request.product_id).await? {
            return Err(AppError::bad_request("unknown product"));
        }

        let feature_ids: Vec<_> = request.features.iter().map(|f| f.feature_id).collect();
        if !self.store.features_exist(&feature_ids).await? {
            return Err(AppError::bad_request("unknown feature in request"));
        }

        let now = Utc::now();
        if let Some(expiration) = request.expiration_date {
            if expiration <= now {
                return Err(AppError::bad_request("expiration date must be in the future"));
            }
        }

        let mut record = LicenseRecord::new(
            request.product_id,
            request.license_type,
            String::new(),
            &request.issued_to,
            &request.issuer,
        );
        record.key = derive_license_key(record.id, request.product_id);
        record.expiration_date = request.expiration_date;

        match request.license_type {
            LicenseType::Standard => {}
            LicenseType::Trial => {
                let period = request
                    .trial_period
                    .filter(|p| p.num_seconds() > 0)
                    .ok_or_else(|| AppError::bad_request("trial requires a positive period"))?;
                record.expiration_date = Some(record.issued_on + period);
            }
            LicenseType::NodeLocked => {
                record.hardware_id = request.hardware_id.clone();
            }
            LicenseType::Subscription => {
                let duration = request
                    .subscription_duration
                    .filter(|d| d.num_seconds() > 0)
                    .ok_or_else(|| {
                        AppError::bad_request("subscription requires a positive duration")
                    })?;
                let start = request.subscription_start_date.unwrap_or(record.issued_on);
                let expiry = start + duration;
                record.subscription_expiry_date = Some(expiry);
                record.expiration_date = Some(expiry);
            }
            LicenseType::Floating | LicenseType::Concurrent => {
                let max = request
                    .max_active_users_count
                    .filter(|m| *m > 0)
                    .ok_or_else(|| {
                        AppError::bad_request("seat-counted license requires a positive seat cap")
                    })?;
                record.max_active_users_count = Some(max);
                record.active_users_count = Some(0);
            }
        }

        self.store.insert_license(&record).await?;

        // Attaching a feature is idempotent per (product, feature): an
        // existing grant is re-enabled and pointed at the new license.
        for grant in &request.features {
            self.store
                .upsert_license_feature(&LicenseFeature {
                    product_id: request.product_id,
                    feature_id: grant.feature_id,
                    license_id: record.id,
                    enabled: grant.enabled,
                })
                .await?;
        }

        tracing::info!(
            license_id = %record.id,
            license_type = %record.license_type,
            product_id = %record.product_id,
            "License generated"
        );

        let license = self.license_from_record(&record).await?;
        self.encode(&license)
    }

    /// Validate a license key, optionally cross-checking a presented
    /// envelope against the persisted row.
    pub async fn validate(
        &self,
        license_key: &str,
        envelope: Option<&[u8]>,
        params: Option<&ValidationParams>,
    ) -> AppResult<ValidationResult> {
        let Some(mut record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(ValidationResult::NotFound);
        };

        let now = Utc::now();
        if record.status == LicenseStatus::Expired || record.is_expired_at(now) {
            if record.status != LicenseStatus::Expired {
                let _lock = self.store.lock_license(record.id).await;
                record.status = LicenseStatus::Expired;
                self.store.update_license(&record).await?;
                tracing::info!(license_id = %record.id, "License marked expired");
            }
            return Ok(ValidationResult::Expired);
        }

        if record.status == LicenseStatus::Revoked {
            return Ok(ValidationResult::Revoked);
        }

        if let Some(bytes) = envelope {
            let license = match self.codec.decode(bytes, self.secrets.public_key()) {
                Ok(license) => license,
                Err(e) => return Ok(ValidationResult::invalid(e.kind, e.message)),
            };
            if let Some(failure) = cross_check(&license, &record, params) {
                return Ok(failure);
            }
        }

        Ok(ValidationResult::Valid)
    }

    /// Activate a license, taking a seat for seat-counted variants.
    pub async fn activate(
        &self,
        license_key: &str,
        hardware_id: Option<&str>,
    ) -> AppResult<ActivationResult> {
        let validation = self.validate(license_key, None, None).await?;
        if !validation.is_valid() {
            return Ok(ActivationResult::Rejected(validation));
        }

        let Some(record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(ActivationResult::Rejected(ValidationResult::NotFound));
        };

        let _lock = self.store.lock_license(record.id).await;
        let Some(mut record) = self.store.find_license(record.id).await? else {
            return Ok(ActivationResult::Rejected(ValidationResult::NotFound));
        };

        match record.license_type {
            LicenseType::Standard | LicenseType::Trial => {
                record.status = LicenseStatus::Active;
                self.store.update_license(&record).await?;
            }
            LicenseType::NodeLocked => {
                let hardware_id = hardware_id.ok_or_else(|| {
                    AppError::bad_request("node-locked activation requires a hardware id")
                })?;
                record.hardware_id = Some(hardware_id.to_string());
                record.status = LicenseStatus::Active;
                self.store.update_license(&record).await?;
            }
            LicenseType::Subscription => {
                let now = Utc::now();
                if record.subscription_expiry_date.is_some_and(|e| e < now) {
                    return Ok(ActivationResult::Rejected(ValidationResult::Expired));
                }
                record.status = LicenseStatus::Active;
                self.store.update_license(&record).await?;
            }
            LicenseType::Floating | LicenseType::Concurrent => {
                let machine_id = hardware_id.ok_or_else(|| {
                    AppError::bad_request("seat activation requires a machine id")
                })?;

                // Re-activation from the same machine refreshes its seat
                // instead of consuming another.
                if let Some(existing) =
                    self.store.find_activation(record.id, machine_id).await?
                {
                    self.store
                        .touch_activation(record.id, &existing.machine_id, Utc::now())
                        .await?;
                    return Ok(ActivationResult::Activated);
                }

                let max = record.max_active_users_count.unwrap_or(0);
                let count = self.store.count_activations(record.id).await?;
                if count >= max {
                    tracing::warn!(
                        license_id = %record.id,
                        seats = max,
                        "Seat cap reached"
                    );
                    return Ok(ActivationResult::MaximumActivationsReached);
                }

                self.store
                    .insert_activation(&Activation::new(record.id, machine_id))
                    .await?;
                record.active_users_count = Some(count + 1);
                record.status = LicenseStatus::Active;
                self.store.update_license(&record).await?;

                tracing::info!(
                    license_id = %record.id,
                    machine_id,
                    seats_used = count + 1,
                    seats_total = max,
                    "Seat activated"
                );
            }
        }

        Ok(ActivationResult::Activated)
    }

    /// Revoke a license, or release one machine's seat for seat-counted
    /// variants.
    pub async fn revoke(
        &self,
        license_key: &str,
        hardware_id: Option<&str>,
    ) -> AppResult<DeactivationResult> {
        let Some(record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(DeactivationResult::NotFound);
        };

        let _lock = self.store.lock_license(record.id).await;
        let Some(mut record) = self.store.find_license(record.id).await? else {
            return Ok(DeactivationResult::NotFound);
        };

        match record.license_type {
            LicenseType::Floating | LicenseType::Concurrent => {
                let machine_id = hardware_id.ok_or_else(|| {
                    AppError::bad_request("seat release requires a machine id")
                })?;

                let Some(activation) =
                    self.store.find_activation(record.id, machine_id).await?
                else {
                    return Ok(DeactivationResult::NotFound);
                };

                self.store.remove_activation(activation.id).await?;
                let count = self.store.count_activations(record.id).await?;
                record.active_users_count = Some(count);
                self.store.update_license(&record).await?;

                tracing::info!(
                    license_id = %record.id,
                    machine_id,
                    seats_used = count,
                    "Seat released"
                );
            }
            LicenseType::NodeLocked => {
                record.hardware_id = None;
                record.status = LicenseStatus::Revoked;
                self.store.update_license(&record).await?;
            }
            LicenseType::Standard | LicenseType::Trial | LicenseType::Subscription => {
                record.status = LicenseStatus::Revoked;
                self.store.update_license(&record).await?;
            }
        }

        Ok(DeactivationResult::Deactivated)
    }

    /// Release a concurrent seat; rejects every other variant.
    pub async fn disconnect_concurrent(
        &self,
        license_key: &str,
        hardware_id: Option<&str>,
    ) -> AppResult<DeactivationResult> {
        let Some(record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(DeactivationResult::NotFound);
        };

        if record.license_type != LicenseType::Concurrent {
            return Err(AppError::invalid_format(
                "disconnect is only valid for concurrent licenses",
            ));
        }

        self.revoke(license_key, hardware_id).await
    }

    /// Extend a subscription. Only forward renewals of non-revoked
    /// subscription licenses are accepted.
    pub async fn renew(
        &self,
        license_key: &str,
        new_expiration: chrono::DateTime<Utc>,
    ) -> AppResult<RenewalResult> {
        let Some(record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(RenewalResult::rejected(ErrorKind::NotFound, "unknown license"));
        };

        if record.license_type != LicenseType::Subscription {
            return Ok(RenewalResult::rejected(
                ErrorKind::BadRequest,
                "only subscription licenses can be renewed",
            ));
        }

        if record.status == LicenseStatus::Revoked {
            return Ok(RenewalResult::rejected(
                ErrorKind::BadRequest,
                "a revoked license cannot be renewed",
            ));
        }

        let now = Utc::now();
        if new_expiration <= now {
            return Ok(RenewalResult::rejected(
                ErrorKind::BadRequest,
                "renewal expiration must be in the future",
            ));
        }
        if record
            .subscription_expiry_date
            .is_some_and(|current| new_expiration <= current)
        {
            return Ok(RenewalResult::rejected(
                ErrorKind::BadRequest,
                "renewal must extend the current subscription",
            ));
        }

        let _lock = self.store.lock_license(record.id).await;
        let Some(mut record) = self.store.find_license(record.id).await? else {
            return Ok(RenewalResult::rejected(ErrorKind::NotFound, "unknown license"));
        };

        record.subscription_expiry_date = Some(new_expiration);
        record.expiration_date = Some(new_expiration);
        record.status = LicenseStatus::Active;
        self.store.update_license(&record).await?;

        tracing::info!(
            license_id = %record.id,
            expiry = %new_expiration,
            "Subscription renewed"
        );

        let license = self.license_from_record(&record).await?;
        let envelope = self.encode(&license)?;
        Ok(RenewalResult::Renewed { envelope })
    }

    /// Refresh the heartbeat of one machine's activation. Returns `false`
    /// when no matching activation exists.
    pub async fn heartbeat(&self, license_key: &str, machine_id: &str) -> AppResult<bool> {
        let Some(record) = self.store.find_license_by_key(license_key).await? else {
            return Ok(false);
        };

        let touched = self
            .store
            .touch_activation(record.id, machine_id, Utc::now())
            .await?;

        if touched {
            tracing::trace!(license_id = %record.id, machine_id, "Heartbeat recorded");
        }
        Ok(touched)
    }

    /// Rebuild the envelope-form license from a persisted row.
    async fn license_from_record(&self, record: &LicenseRecord) -> AppResult<License> {
        let mut features = BTreeMap::new();
        for (def, enabled) in self.store.features_for_license(record.id).await? {
            features.insert(def.name, FeatureValue::Boolean(enabled));
        }

        let info = LicenseInfo {
            license_id: record.id,
            license_key: record.key.clone(),
            issued_on: record.issued_on,
            expiration_date: record.expiration_date,
            issuer: record.issuer.clone(),
            features,
        };

        let license = match record.license_type {
            LicenseType::Standard => License::Standard(StandardLicense {
                info,
                user_name: record.issued_to.clone(),
            }),
            LicenseType::Trial => {
                let expiry = record.expiration_date.ok_or_else(|| {
                    AppError::internal("trial row is missing its expiration date")
                })?;
                License::Trial(TrialLicense {
                    trial_period: expiry - record.issued_on,
                    info,
                })
            }
            LicenseType::NodeLocked => License::NodeLocked(NodeLockedLicense {
                hardware_id: record.hardware_id.clone().unwrap_or_default(),
                info,
            }),
            LicenseType::Subscription => {
                let expiry = record.subscription_expiry_date.ok_or_else(|| {
                    AppError::internal("subscription row is missing its expiry date")
                })?;
                License::Subscription(SubscriptionLicense {
                    user_name: record.issued_to.clone(),
                    subscription_start_date: record.issued_on,
                    subscription_duration: expiry - record.issued_on,
                    info,
                })
            }
            LicenseType::Floating => License::Floating(FloatingLicense {
                user_name: record.issued_to.clone(),
                max_active_users_count: record.max_active_users_count.unwrap_or(0),
                info,
            }),
            LicenseType::Concurrent => License::Concurrent(ConcurrentLicense {
                user_name: record.issued_to.clone(),
                max_active_users_count: record.max_active_users_count.unwrap_or(0),
                info,
            }),
        };

        Ok(license)
    }

    fn encode(&self, license: &License) -> AppResult<Vec<u8>> {
        let private_key = self.secrets.require_private_key().map_err(AppError::from)?;
        self.codec.encode(license, private_key)
    }
}

/// Cross-check a decoded envelope against the persisted row and caller
/// parameters. Returns the failure, or `None` when everything matches.
fn cross_check(
    license: &License,
    record: &LicenseRecord,
    params: Option<&ValidationParams>,
) -> Option<ValidationResult> {
    if license.license_type() != record.license_type {
        return Some(ValidationResult::invalid(
            ErrorKind::InvalidFormat,
            "envelope variant does not match the issued license",
        ));
    }

    if license.info().license_id != record.id {
        return Some(ValidationResult::invalid(
            ErrorKind::InvalidFormat,
            "envelope license id does not match the issued license",
        ));
    }

    if license.info().issued_on != record.issued_on {
        return Some(ValidationResult::invalid(
            ErrorKind::InvalidFormat,
            "envelope issue date does not match the issued license",
        ));
    }

    match record.license_type {
        LicenseType::NodeLocked => {
            if let Some(requested) = params.and_then(|p| p.hardware_id.as_deref()) {
                if license.hardware_id() != Some(requested) {
                    return Some(ValidationResult::invalid(
                        ErrorKind::HardwareMismatch,
                        "hardware id does not match the licensed machine",
                    ));
                }
            }
        }
        LicenseType::Standard => {
            if let Some(params) = params {
                let key_ok = params.license_key.as_deref() == Some(license.license_key());
                let user_ok = params.user_name.as_deref() == license.user_name();
                if !key_ok || !user_ok {
                    return Some(ValidationResult::invalid(
                        ErrorKind::UserMismatch,
                        "user name or license key does not match",
                    ));
                }
            }
        }
        LicenseType::Subscription => {
            let within = match (license.info().expiration_date, record.subscription_expiry_date) {
                (Some(encoded), Some(persisted)) => encoded <= persisted,
                _ => false,
            };
            if !within {
                return Some(ValidationResult::invalid(
                    ErrorKind::Validation,
                    "envelope subscription end exceeds the issued expiry",
                ));
            }
        }
        LicenseType::Floating | LicenseType::Concurrent => {
            let cap_ok = license.max_active_users_count() == record.max_active_users_count;
            let user_ok = license.user_name() == Some(record.issued_to.as_str());
            if !cap_ok || !user_ok {
                return Some(ValidationResult::invalid(
                    ErrorKind::UserMismatch,
                    "seat cap or user name does not match the issued license",
                ));
            }
        }
        LicenseType::Trial => {}
    }

    None
}

/// Derive a grouped, human-readable license key from the license and
/// product identifiers.
fn derive_license_key(license_id: LicenseId, product_id: ProductId) -> String {
    let mut data = Vec::with_capacity(32);
    data.extend_from_slice(license_id.as_uuid().as_bytes());
    data.extend_from_slice(product_id.as_uuid().as_bytes());

    let digest = hash::sha256(&data);
    let hex: String = digest.iter().map(|b| format!("{b:02X}")).collect();

    hex.as_bytes()
        .chunks(4)
        .take(6)
        .map(|chunk| std::str::from_utf8(chunk).expect("hex is ASCII"))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_keys_are_grouped_and_deterministic() {
        let license_id = LicenseId::new();
        let product_id = ProductId::new();

        let a = derive_license_key(license_id, product_id);
        let b = derive_license_key(license_id, product_id);

        assert_eq!(a, b);
        assert_eq!(a.len(), 29, "six groups of four plus five dashes");
        assert_eq!(a.split('-').count(), 6);
    }

    #[test]
    fn derived_keys_differ_across_licenses() {
        let product_id = ProductId::new();
        let a = derive_license_key(LicenseId::new(), product_id);
        let b = derive_license_key(LicenseId::new(), product_id);
        assert_ne!(a, b);
    }
}
