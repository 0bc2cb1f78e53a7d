//! Activation engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for the server-side activation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How often the reclamation worker runs, in seconds.
    #[serde(default = "default_reclamation_interval")]
    pub reclamation_interval_seconds: u64,
    /// Age after which an activation with no heartbeat is reclaimed, in
    /// seconds. Must not be smaller than the client heartbeat interval.
    #[serde(default = "default_activation_timeout")]
    pub activation_timeout_seconds: u64,
    /// RSA key size in bits used when generating licensing secrets.
    #[serde(default = "default_rsa_bits")]
    pub rsa_key_bits: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reclamation_interval_seconds: default_reclamation_interval(),
            activation_timeout_seconds: default_activation_timeout(),
            rsa_key_bits: default_rsa_bits(),
        }
    }
}

fn default_reclamation_interval() -> u64 {
    300
}

fn default_activation_timeout() -> u64 {
    600
}

fn default_rsa_bits() -> usize {
    2048
}
