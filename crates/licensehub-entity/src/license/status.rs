//! Server-side license status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted license row.
///
/// `Revoked` and `Expired` are terminal, except that a subscription may
/// move `Expired -> Active` through renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseStatus {
    /// The license may be activated and validated.
    Active,
    /// The license expiry date has passed.
    Expired,
    /// The license was revoked by the issuer.
    Revoked,
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Expired => write!(f, "Expired"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}
