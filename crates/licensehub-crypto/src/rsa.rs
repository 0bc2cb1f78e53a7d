//! RSA PKCS#1 v1.5 signing and verification over SHA-256, plus key
//! serialization as base64-encoded raw PKCS#1 DER.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ::rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use ::rsa::sha2::{Digest, Sha256};
use ::rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::error::CryptoError;

/// Sign `data` with an RSA PKCS#1 v1.5 signature over its SHA-256 digest.
pub fn sign(data: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    let digest = Sha256::digest(data);
    private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|_| CryptoError::SigningFailed)
}

/// Verify an RSA PKCS#1 v1.5 signature over the SHA-256 digest of `data`.
///
/// Returns `false` on any cryptographic failure; never panics and never
/// surfaces key material.
pub fn verify(data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
    let digest = Sha256::digest(data);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .is_ok()
}

/// Generate a fresh RSA keypair of the given size.
pub fn generate_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey), CryptoError> {
    let mut rng = rand::rngs::OsRng;
    let private = RsaPrivateKey::new(&mut rng, bits).map_err(|_| CryptoError::InvalidKey)?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

/// Serialize a private key as base64-encoded PKCS#1 DER.
pub fn encode_private_key(key: &RsaPrivateKey) -> Result<String, CryptoError> {
    let der = key.to_pkcs1_der().map_err(|_| CryptoError::InvalidKey)?;
    Ok(BASE64.encode(der.as_bytes()))
}

/// Serialize a public key as base64-encoded PKCS#1 DER.
pub fn encode_public_key(key: &RsaPublicKey) -> Result<String, CryptoError> {
    let der = key.to_pkcs1_der().map_err(|_| CryptoError::InvalidKey)?;
    Ok(BASE64.encode(der.as_bytes()))
}

/// Parse a private key from base64-encoded PKCS#1 DER.
pub fn decode_private_key(encoded: &str) -> Result<RsaPrivateKey, CryptoError> {
    let der = BASE64.decode(encoded).map_err(|_| CryptoError::InvalidKey)?;
    RsaPrivateKey::from_pkcs1_der(&der).map_err(|_| CryptoError::InvalidKey)
}

/// Parse a public key from base64-encoded PKCS#1 DER.
pub fn decode_public_key(encoded: &str) -> Result<RsaPublicKey, CryptoError> {
    let der = BASE64.decode(encoded).map_err(|_| CryptoError::InvalidKey)?;
    RsaPublicKey::from_pkcs1_der(&der).map_err(|_| CryptoError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| generate_keypair(2048).unwrap())
    }

    #[test]
    fn sign_verify_round_trip() {
        let (private, public) = keypair();
        let sig = sign(b"envelope hash", private).unwrap();
        assert!(verify(b"envelope hash", &sig, public));
    }

    #[test]
    fn verify_rejects_modified_data() {
        let (private, public) = keypair();
        let sig = sign(b"envelope hash", private).unwrap();
        assert!(!verify(b"envelope hasH", &sig, public));
    }

    #[test]
    fn verify_rejects_garbage_signature() {
        let (_, public) = keypair();
        assert!(!verify(b"data", &[0u8; 12], public));
    }

    #[test]
    fn keys_round_trip_through_pkcs1_der() {
        let (private, public) = keypair();

        let private_again = decode_private_key(&encode_private_key(private).unwrap()).unwrap();
        let public_again = decode_public_key(&encode_public_key(public).unwrap()).unwrap();

        let sig = sign(b"data", &private_again).unwrap();
        assert!(verify(b"data", &sig, &public_again));
    }
}
