//! # licensehub-entity
//!
//! Domain entities: the client-side license model (six variants plus the
//! typed feature union) and the server-side persistence rows.

pub mod activation;
pub mod license;
pub mod product;
pub mod record;

pub use activation::Activation;
pub use license::feature::FeatureValue;
pub use license::model::{
    ConcurrentLicense, FloatingLicense, License, LicenseInfo, LicenseType, NodeLockedLicense,
    StandardLicense, SubscriptionLicense, TrialLicense,
};
pub use license::status::LicenseStatus;
pub use product::{FeatureDef, LicenseFeature, Product};
pub use record::LicenseRecord;
