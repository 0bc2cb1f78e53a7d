//! Crypto-layer error type.

use licensehub_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Errors raised by the cryptographic primitives.
///
/// Variants carry no key material; messages are safe to log and to return
/// to callers.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Decryption failed (wrong key, bad padding, or corrupted data).
    #[error("decryption failed")]
    DecryptionFailed,

    /// The input does not have the expected shape (IV, block alignment,
    /// key length).
    #[error("invalid cryptographic input: {0}")]
    InvalidInput(&'static str),

    /// RSA signing failed.
    #[error("signing failed")]
    SigningFailed,

    /// An RSA key could not be parsed or serialized.
    #[error("invalid RSA key material")]
    InvalidKey,

    /// The secrets file is corrupt, missing, or undecryptable.
    #[error("secrets error: {0}")]
    Secrets(String),
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        let kind = match &err {
            CryptoError::Secrets(_) | CryptoError::InvalidKey => ErrorKind::KeyManagement,
            _ => ErrorKind::Crypto,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
