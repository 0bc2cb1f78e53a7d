//! Process-wide licensing secrets and their encrypted on-disk form.
//!
//! The secrets file is AES-256-CBC over a zero IV with a key derived as
//! `SHA-256(passphrase)`, covering the JSON encoding of
//! `{ PublicKey, PrivateKey, EncryptionKey, ApiKey }`. The zero IV is
//! acceptable only because exactly one plaintext is ever encrypted per
//! file; re-encryption writes a whole new file.

use std::path::Path;

use ::rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::aes::{decrypt_with_iv, encrypt_with_iv, IV_LEN};
use crate::error::CryptoError;
use crate::hash::sha256;
use crate::rsa::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    generate_keypair,
};

/// On-disk JSON shape of the secrets file.
#[derive(Debug, Serialize, Deserialize)]
struct SecretsFile {
    #[serde(rename = "PublicKey")]
    public_key: String,
    #[serde(rename = "PrivateKey")]
    private_key: Option<String>,
    #[serde(rename = "EncryptionKey")]
    encryption_key: Option<String>,
    #[serde(rename = "ApiKey")]
    api_key: String,
}

/// Process-wide licensing secrets.
///
/// Initialized once from configuration or from the encrypted secrets file
/// and read-only thereafter; the engine and the client manager hold it
/// behind an `Arc`. The private key is optional so verify-only deployments
/// can load a public-key-only file.
#[derive(Debug, Clone)]
pub struct LicensingSecrets {
    public_key: RsaPublicKey,
    private_key: Option<RsaPrivateKey>,
    api_key: String,
}

impl LicensingSecrets {
    /// Generate a fresh keypair and API key.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let (private, public) = generate_keypair(bits)?;
        let api_key = crate::hash::base64_checksum(&crate::aes::generate_aes_key());
        Ok(Self {
            public_key: public,
            private_key: Some(private),
            api_key,
        })
    }

    /// Build secrets from already-encoded key material.
    pub fn from_encoded(
        public_key: &str,
        private_key: Option<&str>,
        api_key: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            public_key: decode_public_key(public_key)?,
            private_key: private_key.map(decode_private_key).transpose()?,
            api_key: api_key.into(),
        })
    }

    /// The RSA public key used to verify envelopes.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// The RSA private key used to sign envelopes, if present.
    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    /// The private key, or a key-management error for verify-only secrets.
    pub fn require_private_key(&self) -> Result<&RsaPrivateKey, CryptoError> {
        self.private_key
            .as_ref()
            .ok_or_else(|| CryptoError::Secrets("no private key loaded".to_string()))
    }

    /// The API key presented to the activation service.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Encrypt these secrets under `passphrase` and write them to `path`.
    pub fn save_to_file(&self, path: &Path, passphrase: &str) -> Result<(), CryptoError> {
        let file = SecretsFile {
            public_key: encode_public_key(&self.public_key)?,
            private_key: self
                .private_key
                .as_ref()
                .map(encode_private_key)
                .transpose()?,
            encryption_key: None,
            api_key: self.api_key.clone(),
        };

        let plain = serde_json::to_vec(&file)
            .map_err(|e| CryptoError::Secrets(format!("serialize secrets: {e}")))?;

        let key = sha256(passphrase.as_bytes());
        let cipher = encrypt_with_iv(&plain, &key, &[0u8; IV_LEN])?;

        std::fs::write(path, cipher)
            .map_err(|e| CryptoError::Secrets(format!("write secrets file: {e}")))
    }

    /// Load and decrypt secrets from `path` using `passphrase`.
    pub fn load_from_file(path: &Path, passphrase: &str) -> Result<Self, CryptoError> {
        let cipher = std::fs::read(path)
            .map_err(|e| CryptoError::Secrets(format!("read secrets file: {e}")))?;

        let key = sha256(passphrase.as_bytes());
        let plain = decrypt_with_iv(&cipher, &key, &[0u8; IV_LEN])
            .map_err(|_| CryptoError::Secrets("secrets file undecryptable".to_string()))?;

        let file: SecretsFile = serde_json::from_slice(&plain)
            .map_err(|_| CryptoError::Secrets("secrets file corrupt".to_string()))?;

        Self::from_encoded(&file.public_key, file.private_key.as_deref(), file.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn secrets() -> &'static LicensingSecrets {
        static SECRETS: OnceLock<LicensingSecrets> = OnceLock::new();
        SECRETS.get_or_init(|| LicensingSecrets::generate(2048).unwrap())
    }

    #[test]
    fn secrets_file_round_trip() {
        let dir = std::env::temp_dir().join("licensehub-secrets-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secrets.bin");

        secrets().save_to_file(&path, "pw").unwrap();
        let loaded = LicensingSecrets::load_from_file(&path, "pw").unwrap();

        assert_eq!(loaded.api_key(), secrets().api_key());
        let sig = crate::rsa::sign(b"data", loaded.require_private_key().unwrap()).unwrap();
        assert!(crate::rsa::verify(b"data", &sig, loaded.public_key()));
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let dir = std::env::temp_dir().join("licensehub-secrets-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secrets-wrong-pw.bin");

        secrets().save_to_file(&path, "pw").unwrap();
        let result = LicensingSecrets::load_from_file(&path, "not-pw");

        assert!(matches!(result, Err(CryptoError::Secrets(_))));
    }

    #[test]
    fn missing_file_is_a_secrets_error() {
        let result =
            LicensingSecrets::load_from_file(Path::new("/nonexistent/secrets.bin"), "pw");
        assert!(matches!(result, Err(CryptoError::Secrets(_))));
    }
}
