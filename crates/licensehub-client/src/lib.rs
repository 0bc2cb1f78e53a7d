//! # licensehub-client
//!
//! The client-side license manager: loading and saving envelopes,
//! dispatching offline validation through the rule registry or online
//! validation through the activation service, publishing the current
//! license to the feature manager, and keeping a single heartbeat task
//! alive for concurrent licenses.

pub mod features;
pub mod hardware;
pub mod heartbeat;
pub mod manager;
pub mod remote;

pub use features::FeatureManager;
pub use hardware::MachineIdentifier;
pub use manager::{LicenseManager, LicenseSource, LoadMode, LoadResult};
pub use remote::{ActivationApi, HttpActivationApi};
