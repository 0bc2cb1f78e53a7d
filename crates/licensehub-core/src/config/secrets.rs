//! Licensing secrets configuration.

use serde::{Deserialize, Serialize};

/// Settings for locating and decrypting the licensing secrets file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Path to the encrypted secrets file.
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,
    /// Name of the environment variable holding the passphrase.
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            secrets_file: default_secrets_file(),
            passphrase_env: default_passphrase_env(),
        }
    }
}

fn default_secrets_file() -> String {
    "data/secrets/licensing.bin".to_string()
}

fn default_passphrase_env() -> String {
    "LICENSEHUB_SECRETS_PASSPHRASE".to_string()
}
