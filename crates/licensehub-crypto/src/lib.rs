//! # licensehub-crypto
//!
//! Cryptographic primitives for the license envelope: AES-256-CBC payload
//! encryption, RSA PKCS#1 v1.5 signing over SHA-256, hashing helpers, and
//! the process-wide licensing secrets (RSA keypair + API key) with their
//! encrypted on-disk form.

pub mod aes;
pub mod error;
pub mod hash;
pub mod rsa;
pub mod secrets;

pub use crate::aes::{decrypt, encrypt, generate_aes_key, AES_KEY_LEN, IV_LEN};
pub use crate::error::CryptoError;
pub use crate::hash::{base64_checksum, sha256};
pub use crate::rsa::{sign, verify};
pub use crate::secrets::LicensingSecrets;
