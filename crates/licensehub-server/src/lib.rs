//! # licensehub-server
//!
//! The activation engine: license generation, validation, activation,
//! revocation, renewal, and heartbeats, with seat accounting for floating
//! and concurrent licenses, over an abstract persistence port. A
//! background reclamation worker removes activations whose heartbeats
//! have lapsed.

pub mod engine;
pub mod reclaim;
pub mod requests;
pub mod results;
pub mod store;

pub use engine::ActivationEngine;
pub use reclaim::ReclamationService;
pub use requests::{FeatureGrant, GenerateRequest};
pub use results::{ActivationResult, DeactivationResult, RenewalResult, ValidationResult};
pub use store::memory::MemoryLicenseStore;
pub use store::{LicenseLock, LicenseStore};
