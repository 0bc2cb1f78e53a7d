//! Abstract persistence port for the activation engine.
//!
//! Any ordered, transactional store can sit behind this trait; the engine
//! only requires that every read-modify-write of a license row happens
//! while holding the lock returned by [`LicenseStore::lock_license`].

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use licensehub_core::types::id::{ActivationId, FeatureId, LicenseId, ProductId};
use licensehub_core::AppResult;
use licensehub_entity::{Activation, FeatureDef, LicenseFeature, LicenseRecord};

/// An exclusive hold on one license row.
///
/// Realized here as a named mutex keyed by license id; a SQL-backed store
/// would map this to a transactional row lock instead. Dropping the guard
/// releases the row.
#[derive(Debug)]
pub struct LicenseLock {
    _guard: OwnedMutexGuard<()>,
}

impl LicenseLock {
    pub(crate) fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

/// Transactional lookup/update of licenses, activations, products, and
/// feature grants.
#[async_trait]
pub trait LicenseStore: Send + Sync + 'static {
    /// Whether a product exists.
    async fn product_exists(&self, id: ProductId) -> AppResult<bool>;

    /// Whether every listed feature exists.
    async fn features_exist(&self, ids: &[FeatureId]) -> AppResult<bool>;

    /// Fetch feature definitions by id; unknown ids are skipped.
    async fn find_feature_defs(&self, ids: &[FeatureId]) -> AppResult<Vec<FeatureDef>>;

    /// Fetch a license by id.
    async fn find_license(&self, id: LicenseId) -> AppResult<Option<LicenseRecord>>;

    /// Fetch a license by key.
    async fn find_license_by_key(&self, key: &str) -> AppResult<Option<LicenseRecord>>;

    /// Insert a fresh license row.
    async fn insert_license(&self, record: &LicenseRecord) -> AppResult<()>;

    /// Update an existing license row.
    async fn update_license(&self, record: &LicenseRecord) -> AppResult<()>;

    /// Count activations belonging to a license.
    async fn count_activations(&self, license_id: LicenseId) -> AppResult<u32>;

    /// Find the activation binding a license to a machine.
    async fn find_activation(
        &self,
        license_id: LicenseId,
        machine_id: &str,
    ) -> AppResult<Option<Activation>>;

    /// Insert an activation row.
    async fn insert_activation(&self, activation: &Activation) -> AppResult<()>;

    /// Remove an activation row. Returns `false` if it was already gone.
    async fn remove_activation(&self, id: ActivationId) -> AppResult<bool>;

    /// Move `last_heartbeat_at` forward on the matching activation.
    /// Returns `false` when no such activation exists. Never moves the
    /// timestamp backwards.
    async fn touch_activation(
        &self,
        license_id: LicenseId,
        machine_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// All activations whose last heartbeat is older than `threshold`.
    async fn select_stale_activations(
        &self,
        threshold: DateTime<Utc>,
    ) -> AppResult<Vec<Activation>>;

    /// Create or repoint the feature grant keyed by
    /// `(product_id, feature_id)`.
    async fn upsert_license_feature(&self, link: &LicenseFeature) -> AppResult<()>;

    /// Feature definitions granted to a license, with their enabled flag.
    async fn features_for_license(
        &self,
        license_id: LicenseId,
    ) -> AppResult<Vec<(FeatureDef, bool)>>;

    /// Acquire the per-license row lock.
    async fn lock_license(&self, id: LicenseId) -> LicenseLock;
}
