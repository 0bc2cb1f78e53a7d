//! Product and feature definition rows.

use licensehub_core::types::id::{FeatureId, LicenseId, ProductId};
use serde::{Deserialize, Serialize};

/// A licensed product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
}

/// A feature a product can grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDef {
    /// Unique feature identifier.
    pub id: FeatureId,
    /// Case-sensitive feature name as it appears in license payloads.
    pub name: String,
}

/// Link between a product feature and the license that currently grants
/// it. Composite key is `(product_id, feature_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFeature {
    pub product_id: ProductId,
    pub feature_id: FeatureId,
    /// License this grant currently points at.
    pub license_id: LicenseId,
    /// Whether the grant is enabled.
    pub enabled: bool,
}
