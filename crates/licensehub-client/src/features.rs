//! Feature queries over the current license.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use licensehub_core::error::AppError;
use licensehub_core::AppResult;
use licensehub_entity::{FeatureValue, License};

/// Evaluates typed feature entries in the current license.
///
/// Shares the current-license slot with the [`crate::LicenseManager`]
/// that publishes into it. Lookups are exact-match on case-sensitive
/// names; typed accessors return the type default when the feature is
/// absent or of another type.
#[derive(Debug, Clone)]
pub struct FeatureManager {
    current: Arc<RwLock<Option<License>>>,
}

impl FeatureManager {
    /// Create a feature manager over a shared current-license slot.
    pub(crate) fn new(current: Arc<RwLock<Option<License>>>) -> Self {
        Self { current }
    }

    /// Whether the named feature exists and is enabled.
    pub async fn is_enabled(&self, name: &str) -> bool {
        self.with_feature(name, FeatureValue::is_enabled)
            .await
            .unwrap_or(false)
    }

    /// Fail with `FeatureNotLicensed` unless the feature is enabled.
    pub async fn require(&self, name: &str) -> AppResult<()> {
        if self.is_enabled(name).await {
            Ok(())
        } else {
            Err(AppError::feature_not_licensed(format!(
                "feature '{name}' is not licensed"
            )))
        }
    }

    /// Integer value, or 0.
    pub async fn as_int(&self, name: &str) -> i32 {
        self.with_feature(name, |value| match value {
            FeatureValue::Integer(i) => Some(*i),
            _ => None,
        })
        .await
        .flatten()
        .unwrap_or(0)
    }

    /// Float value, or 0.0.
    pub async fn as_float(&self, name: &str) -> f32 {
        self.with_feature(name, |value| match value {
            FeatureValue::Float(f) => Some(*f),
            _ => None,
        })
        .await
        .flatten()
        .unwrap_or(0.0)
    }

    /// String value, or the empty string.
    pub async fn as_string(&self, name: &str) -> String {
        self.with_feature(name, |value| match value {
            FeatureValue::String(s) => Some(s.clone()),
            _ => None,
        })
        .await
        .flatten()
        .unwrap_or_default()
    }

    /// Timestamp value, or the epoch.
    pub async fn as_datetime(&self, name: &str) -> DateTime<Utc> {
        self.with_feature(name, |value| match value {
            FeatureValue::DateTime(d) => Some(*d),
            _ => None,
        })
        .await
        .flatten()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Blob value, or empty bytes.
    pub async fn as_bytes(&self, name: &str) -> Vec<u8> {
        self.with_feature(name, |value| match value {
            FeatureValue::ByteArray(b) => Some(b.clone()),
            _ => None,
        })
        .await
        .flatten()
        .unwrap_or_default()
    }

    async fn with_feature<T>(&self, name: &str, f: impl FnOnce(&FeatureValue) -> T) -> Option<T> {
        let current = self.current.read().await;
        current
            .as_ref()
            .and_then(|license| license.info().features.get(name))
            .map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licensehub_core::error::ErrorKind;
    use licensehub_entity::StandardLicense;

    fn manager_with(license: License) -> FeatureManager {
        FeatureManager::new(Arc::new(RwLock::new(Some(license))))
    }

    fn sample() -> License {
        License::Standard(StandardLicense::new("Acme", "John Doe"))
            .with_feature("Reports", FeatureValue::Boolean(true))
            .with_feature("Disabled", FeatureValue::Boolean(false))
            .with_feature("MaxProjects", FeatureValue::Integer(25))
            .with_feature("ZeroInt", FeatureValue::Integer(0))
            .with_feature("Edition", FeatureValue::String("Pro".to_string()))
            .with_feature("Blob", FeatureValue::ByteArray(vec![7, 7]))
    }

    #[tokio::test]
    async fn enablement_per_type_default() {
        let features = manager_with(sample());

        assert!(features.is_enabled("Reports").await);
        assert!(!features.is_enabled("Disabled").await);
        assert!(features.is_enabled("MaxProjects").await);
        assert!(!features.is_enabled("ZeroInt").await);
        assert!(features.is_enabled("Edition").await);
        assert!(!features.is_enabled("Missing").await);
    }

    #[tokio::test]
    async fn lookups_are_case_sensitive() {
        let features = manager_with(sample());
        assert!(features.is_enabled("Reports").await);
        assert!(!features.is_enabled("reports").await);
    }

    #[tokio::test]
    async fn typed_accessors_fall_back_to_defaults() {
        let features = manager_with(sample());

        assert_eq!(features.as_int("MaxProjects").await, 25);
        assert_eq!(features.as_int("Edition").await, 0, "type mismatch");
        assert_eq!(features.as_int("Missing").await, 0);
        assert_eq!(features.as_string("Edition").await, "Pro");
        assert_eq!(features.as_string("MaxProjects").await, "");
        assert_eq!(features.as_bytes("Blob").await, vec![7, 7]);
        assert_eq!(
            features.as_datetime("Missing").await,
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    #[tokio::test]
    async fn require_fails_with_feature_not_licensed() {
        let features = manager_with(sample());

        assert!(features.require("Reports").await.is_ok());
        let err = features.require("Disabled").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::FeatureNotLicensed);
    }

    #[tokio::test]
    async fn empty_slot_disables_everything() {
        let features = FeatureManager::new(Arc::new(RwLock::new(None)));
        assert!(!features.is_enabled("Reports").await);
        assert!(features.require("Reports").await.is_err());
    }
}
