//! The binary license envelope and its codec.
//!
//! Wire layout is four length-prefixed fields in fixed order:
//!
//! ```text
//! u32le hash_len     | hash_len bytes     SHA-256 of the ciphertext
//! u32le sig_len      | sig_len bytes      RSA PKCS#1 v1.5 signature over hash
//! u32le cipher_len   | cipher_len bytes   16-byte IV || AES-256-CBC body
//! u32le aes_key_len  | aes_key_len bytes  raw AES key
//! ```
//!
//! The signature covers the hash and the hash covers the ciphertext, so a
//! verifier rejects tampering before attempting decryption and the RSA
//! operation stays constant-size regardless of payload length.

use std::sync::Arc;

use rsa::{RsaPrivateKey, RsaPublicKey};

use licensehub_core::error::AppError;
use licensehub_core::AppResult;
use licensehub_crypto::{aes, hash, rsa as rsa_sig};
use licensehub_entity::License;

use crate::serializer::{JsonLicenseSerializer, LicenseSerializer};

/// Length of one field prefix.
const LEN_PREFIX: usize = 4;

/// A parsed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// SHA-256 of `cipher`.
    pub hash: Vec<u8>,
    /// RSA signature over `hash`.
    pub signature: Vec<u8>,
    /// IV-prefixed AES-256-CBC ciphertext of the serialized license.
    pub cipher: Vec<u8>,
    /// Raw AES key the payload was encrypted under.
    pub aes_key: Vec<u8>,
}

impl Envelope {
    /// Serialize to the length-prefixed wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let fields = [&self.hash, &self.signature, &self.cipher, &self.aes_key];
        let total: usize = fields.iter().map(|f| LEN_PREFIX + f.len()).sum();

        let mut bytes = Vec::with_capacity(total);
        for field in fields {
            bytes.extend_from_slice(&(field.len() as u32).to_le_bytes());
            bytes.extend_from_slice(field);
        }
        bytes
    }

    /// Parse from the wire form.
    ///
    /// Rejects envelopes whose declared lengths do not exactly cover the
    /// buffer, including any trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let mut offset = 0usize;

        let hash = read_field(bytes, &mut offset)?;
        let signature = read_field(bytes, &mut offset)?;
        let cipher = read_field(bytes, &mut offset)?;
        let aes_key = read_field(bytes, &mut offset)?;

        if offset != bytes.len() {
            return Err(AppError::invalid_format("trailing bytes after envelope"));
        }

        Ok(Self {
            hash,
            signature,
            cipher,
            aes_key,
        })
    }
}

/// Read one `u32le`-prefixed field starting at `*offset`.
fn read_field(bytes: &[u8], offset: &mut usize) -> AppResult<Vec<u8>> {
    let prefix = bytes
        .get(*offset..*offset + LEN_PREFIX)
        .ok_or_else(|| AppError::invalid_format("envelope truncated in length prefix"))?;
    let len = u32::from_le_bytes(prefix.try_into().expect("4-byte slice")) as usize;
    *offset += LEN_PREFIX;

    let end = offset
        .checked_add(len)
        .ok_or_else(|| AppError::invalid_format("envelope field length out of bounds"))?;
    let field = bytes
        .get(*offset..end)
        .ok_or_else(|| AppError::invalid_format("envelope field length out of bounds"))?;
    *offset = end;
    Ok(field.to_vec())
}

/// Encodes licenses into envelopes and decodes/verifies them back.
#[derive(Clone)]
pub struct LicenseCodec {
    serializer: Arc<dyn LicenseSerializer>,
}

impl std::fmt::Debug for LicenseCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseCodec").finish()
    }
}

impl Default for LicenseCodec {
    fn default() -> Self {
        Self::new(Arc::new(JsonLicenseSerializer))
    }
}

impl LicenseCodec {
    /// Create a codec over a custom serializer.
    pub fn new(serializer: Arc<dyn LicenseSerializer>) -> Self {
        Self { serializer }
    }

    /// Encode and sign a license.
    ///
    /// A fresh AES key is drawn per envelope and embedded in it; the
    /// integrity and authenticity of the whole container rest on the RSA
    /// keypair.
    pub fn encode(&self, license: &License, private_key: &RsaPrivateKey) -> AppResult<Vec<u8>> {
        let payload = self.serializer.serialize(license)?;

        let aes_key = aes::generate_aes_key();
        let cipher = aes::encrypt(payload.as_bytes(), &aes_key).map_err(AppError::from)?;
        let digest = hash::sha256(&cipher);
        let signature = rsa_sig::sign(&digest, private_key).map_err(AppError::from)?;

        let envelope = Envelope {
            hash: digest.to_vec(),
            signature,
            cipher,
            aes_key: aes_key.to_vec(),
        };

        tracing::debug!(
            license_id = %license.info().license_id,
            license_type = %license.license_type(),
            size = envelope.cipher.len(),
            "License encoded"
        );

        Ok(envelope.to_bytes())
    }

    /// Verify and decode an envelope.
    ///
    /// The integrity chain is checked before any decryption: signature
    /// over hash first, then hash over ciphertext.
    pub fn decode(&self, bytes: &[u8], public_key: &RsaPublicKey) -> AppResult<License> {
        let envelope = Envelope::from_bytes(bytes)?;

        if !rsa_sig::verify(&envelope.hash, &envelope.signature, public_key) {
            return Err(AppError::invalid_signature(
                "license signature verification failed",
            ));
        }

        if envelope.hash != hash::sha256(&envelope.cipher) {
            return Err(AppError::invalid_signature(
                "license ciphertext does not match signed hash",
            ));
        }

        let payload = aes::decrypt(&envelope.cipher, &envelope.aes_key)
            .map_err(|_| AppError::invalid_format("license payload undecryptable"))?;
        let payload = String::from_utf8(payload)
            .map_err(|_| AppError::invalid_format("license payload is not valid UTF-8"))?;

        self.serializer.deserialize(&payload)
    }
}
