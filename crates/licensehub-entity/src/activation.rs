//! Server-side activation record.

use chrono::{DateTime, Utc};
use licensehub_core::types::id::{ActivationId, LicenseId};
use serde::{Deserialize, Serialize};

/// A record binding a seat-counted license to one machine.
///
/// Each row is owned by the server-side license transaction that created
/// it; clients never hold references to activations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    /// Unique activation identifier.
    pub id: ActivationId,
    /// License this activation belongs to.
    pub license_id: LicenseId,
    /// Fingerprint of the activated machine.
    pub machine_id: String,
    /// When the seat was taken.
    pub activated_at: DateTime<Utc>,
    /// Last liveness signal from the client.
    pub last_heartbeat_at: DateTime<Utc>,
}

impl Activation {
    /// Create a fresh activation for `machine_id`, with both timestamps
    /// set to now.
    pub fn new(license_id: LicenseId, machine_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ActivationId::new(),
            license_id,
            machine_id: machine_id.into(),
            activated_at: now,
            last_heartbeat_at: now,
        }
    }

    /// Whether the last heartbeat is older than `threshold`.
    pub fn is_stale(&self, threshold: DateTime<Utc>) -> bool {
        self.last_heartbeat_at < threshold
    }
}
