//! In-memory store for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use licensehub_core::types::id::{ActivationId, FeatureId, LicenseId, ProductId};
use licensehub_core::AppResult;
use licensehub_entity::{Activation, FeatureDef, LicenseFeature, LicenseRecord, Product};

use super::{LicenseLock, LicenseStore};

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    features: HashMap<FeatureId, FeatureDef>,
    licenses: HashMap<LicenseId, LicenseRecord>,
    license_keys: HashMap<String, LicenseId>,
    activations: HashMap<ActivationId, Activation>,
    license_features: HashMap<(ProductId, FeatureId), LicenseFeature>,
}

/// In-memory [`LicenseStore`] built on tokio synchronization.
///
/// Row data lives behind one `RwLock`; per-license row locks are
/// lazily-created named mutexes, handed out as owned guards so callers
/// can hold them across awaits.
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    tables: RwLock<Tables>,
    locks: Mutex<HashMap<LicenseId, Arc<Mutex<()>>>>,
}

impl MemoryLicenseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product.
    pub async fn add_product(&self, product: Product) {
        self.tables.write().await.products.insert(product.id, product);
    }

    /// Seed a feature definition.
    pub async fn add_feature_def(&self, feature: FeatureDef) {
        self.tables.write().await.features.insert(feature.id, feature);
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn product_exists(&self, id: ProductId) -> AppResult<bool> {
        Ok(self.tables.read().await.products.contains_key(&id))
    }

    async fn features_exist(&self, ids: &[FeatureId]) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(ids.iter().all(|id| tables.features.contains_key(id)))
    }

    async fn find_feature_defs(&self, ids: &[FeatureId]) -> AppResult<Vec<FeatureDef>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.features.get(id).cloned())
            .collect())
    }

    async fn find_license(&self, id: LicenseId) -> AppResult<Option<LicenseRecord>> {
        Ok(self.tables.read().await.licenses.get(&id).cloned())
    }

    async fn find_license_by_key(&self, key: &str) -> AppResult<Option<LicenseRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .license_keys
            .get(key)
            .and_then(|id| tables.licenses.get(id))
            .cloned())
    }

    async fn insert_license(&self, record: &LicenseRecord) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.license_keys.insert(record.key.clone(), record.id);
        tables.licenses.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_license(&self, record: &LicenseRecord) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.licenses.insert(record.id, record.clone());
        Ok(())
    }

    async fn count_activations(&self, license_id: LicenseId) -> AppResult<u32> {
        let tables = self.tables.read().await;
        Ok(tables
            .activations
            .values()
            .filter(|a| a.license_id == license_id)
            .count() as u32)
    }

    async fn find_activation(
        &self,
        license_id: LicenseId,
        machine_id: &str,
    ) -> AppResult<Option<Activation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activations
            .values()
            .find(|a| a.license_id == license_id && a.machine_id == machine_id)
            .cloned())
    }

    async fn insert_activation(&self, activation: &Activation) -> AppResult<()> {
        self.tables
            .write()
            .await
            .activations
            .insert(activation.id, activation.clone());
        Ok(())
    }

    async fn remove_activation(&self, id: ActivationId) -> AppResult<bool> {
        Ok(self.tables.write().await.activations.remove(&id).is_some())
    }

    async fn touch_activation(
        &self,
        license_id: LicenseId,
        machine_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let activation = tables
            .activations
            .values_mut()
            .find(|a| a.license_id == license_id && a.machine_id == machine_id);

        match activation {
            Some(activation) => {
                if at > activation.last_heartbeat_at {
                    activation.last_heartbeat_at = at;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_stale_activations(
        &self,
        threshold: DateTime<Utc>,
    ) -> AppResult<Vec<Activation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activations
            .values()
            .filter(|a| a.is_stale(threshold))
            .cloned()
            .collect())
    }

    async fn upsert_license_feature(&self, link: &LicenseFeature) -> AppResult<()> {
        self.tables
            .write()
            .await
            .license_features
            .insert((link.product_id, link.feature_id), link.clone());
        Ok(())
    }

    async fn features_for_license(
        &self,
        license_id: LicenseId,
    ) -> AppResult<Vec<(FeatureDef, bool)>> {
        let tables = self.tables.read().await;
        let mut features: Vec<(FeatureDef, bool)> = tables
            .license_features
            .values()
            .filter(|link| link.license_id == license_id)
            .filter_map(|link| {
                tables
                    .features
                    .get(&link.feature_id)
                    .map(|def| (def.clone(), link.enabled))
            })
            .collect();
        features.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        Ok(features)
    }

    async fn lock_license(&self, id: LicenseId) -> LicenseLock {
        let row_lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        LicenseLock::new(row_lock.lock_owned().await)
    }
}
