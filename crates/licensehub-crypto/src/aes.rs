//! AES-256-CBC payload encryption with PKCS#7 padding.
//!
//! Ciphertext layout is `iv || body`: a fresh 16-byte IV is generated per
//! call and prepended so the decryptor needs only the key.

use ::aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<::aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<::aes::Aes256>;

/// AES-256 key length in bytes.
pub const AES_KEY_LEN: usize = 32;

/// AES block / IV length in bytes.
pub const IV_LEN: usize = 16;

/// Generate a fresh 256-bit AES key from the system CSPRNG.
pub fn generate_aes_key() -> [u8; AES_KEY_LEN] {
    let mut key = [0u8; AES_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

/// Encrypt `plain` under `key`, prepending a fresh random IV.
pub fn encrypt(plain: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let body = encrypt_with_iv(plain, key, &iv)?;

    let mut cipher = Vec::with_capacity(IV_LEN + body.len());
    cipher.extend_from_slice(&iv);
    cipher.extend_from_slice(&body);
    Ok(cipher)
}

/// Encrypt `plain` under `key` with an explicit IV; returns the bare
/// ciphertext body without the IV.
///
/// The secrets file uses this with a zero IV because exactly one
/// plaintext is ever encrypted per file; every other caller must go
/// through [`encrypt`], which draws a fresh IV.
pub fn encrypt_with_iv(plain: &[u8], key: &[u8], iv: &[u8; IV_LEN]) -> Result<Vec<u8>, CryptoError> {
    let key: &[u8; AES_KEY_LEN] = key
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("AES key must be 32 bytes"))?;

    Ok(Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plain))
}

/// Decrypt `cipher` (an `iv || body` buffer) under `key`.
pub fn decrypt(cipher: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if cipher.len() < IV_LEN + IV_LEN {
        return Err(CryptoError::InvalidInput(
            "ciphertext shorter than IV plus one block",
        ));
    }

    let (iv, body) = cipher.split_at(IV_LEN);
    let iv: &[u8; IV_LEN] = iv.try_into().expect("split at IV_LEN");
    decrypt_with_iv(body, key, iv)
}

/// Decrypt a bare ciphertext body under `key` with an explicit IV.
pub fn decrypt_with_iv(body: &[u8], key: &[u8], iv: &[u8; IV_LEN]) -> Result<Vec<u8>, CryptoError> {
    let key: &[u8; AES_KEY_LEN] = key
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("AES key must be 32 bytes"))?;

    if body.is_empty() || body.len() % IV_LEN != 0 {
        return Err(CryptoError::InvalidInput("ciphertext body not block aligned"));
    }

    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| CryptoError::DecryptionFailed)
}
