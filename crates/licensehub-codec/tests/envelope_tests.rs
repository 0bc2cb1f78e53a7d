//! Envelope codec tests: round-trip, tamper detection, cross-key
//! rejection, and framing strictness.

use std::sync::OnceLock;

use chrono::{Duration, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};

use licensehub_codec::{Envelope, LicenseCodec};
use licensehub_core::error::ErrorKind;
use licensehub_crypto::rsa::generate_keypair;
use licensehub_entity::{
    ConcurrentLicense, FeatureValue, FloatingLicense, License, NodeLockedLicense,
    StandardLicense, SubscriptionLicense, TrialLicense,
};

fn keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
    static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(2048).unwrap())
}

fn other_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
    static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(2048).unwrap())
}

fn sample_licenses() -> Vec<License> {
    vec![
        License::Standard(StandardLicense::new("Acme", "John Doe"))
            .with_feature("Reports", FeatureValue::Boolean(true))
            .with_feature("MaxProjects", FeatureValue::Integer(25))
            .with_feature("Edition", FeatureValue::String("Pro".to_string())),
        License::Trial(TrialLicense::new("Acme", Duration::days(7))),
        License::NodeLocked(NodeLockedLicense::new("Acme", "HW-AAA")),
        License::Subscription(SubscriptionLicense::new(
            "Acme",
            "Jane",
            Utc::now(),
            Duration::days(30),
        )),
        License::Floating(FloatingLicense::new("Acme", "eng", 10)),
        License::Concurrent(ConcurrentLicense::new("Acme", "ops", 5))
            .with_feature("Blob", FeatureValue::ByteArray(vec![1, 2, 3]))
            .with_feature("RenewBy", FeatureValue::DateTime(Utc::now()))
            .with_feature("Scale", FeatureValue::Float(0.5)),
    ]
}

#[test]
fn round_trip_all_variants() {
    let codec = LicenseCodec::default();
    let (private, public) = keypair();

    for license in sample_licenses() {
        let bytes = codec.encode(&license, private).unwrap();
        let decoded = codec.decode(&bytes, public).unwrap();
        assert_eq!(license, decoded, "{} round trip", license.license_type());
    }
}

#[test]
fn framing_lengths_cover_the_buffer() {
    let codec = LicenseCodec::default();
    let (private, _) = keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
    let bytes = codec.encode(&license, private).unwrap();

    let envelope = Envelope::from_bytes(&bytes).unwrap();
    let field_sum = envelope.hash.len()
        + envelope.signature.len()
        + envelope.cipher.len()
        + envelope.aes_key.len();

    assert_eq!(bytes.len(), field_sum + 16, "four 4-byte length prefixes");
    assert_eq!(envelope.hash.len(), 32);
    assert_eq!(envelope.aes_key.len(), 32);
}

#[test]
fn single_bit_flips_are_rejected_everywhere() {
    let codec = LicenseCodec::default();
    let (private, public) = keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
    let bytes = codec.encode(&license, private).unwrap();

    // Flip one bit in every byte position of every field (skip the four
    // length prefixes so framing stays intact and the crypto checks get
    // exercised).
    let envelope = Envelope::from_bytes(&bytes).unwrap();
    let mut field_offsets = Vec::new();
    let mut offset = 4usize;
    for field in [
        envelope.hash.len(),
        envelope.signature.len(),
        envelope.cipher.len(),
        envelope.aes_key.len(),
    ] {
        field_offsets.push((offset, field));
        offset += field + 4;
    }

    for (start, len) in field_offsets {
        for i in (0..len).step_by(7.max(len / 13)) {
            let mut tampered = bytes.clone();
            tampered[start + i] ^= 0x01;

            let err = codec
                .decode(&tampered, public)
                .expect_err("tampered envelope must not decode");
            assert!(
                matches!(err.kind, ErrorKind::InvalidSignature | ErrorKind::InvalidFormat),
                "unexpected kind {:?} for flip at field offset {i}",
                err.kind
            );
        }
    }
}

#[test]
fn cross_key_decode_is_rejected() {
    let codec = LicenseCodec::default();
    let (private, _) = keypair();
    let (_, other_public) = other_keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
    let bytes = codec.encode(&license, private).unwrap();

    let err = codec.decode(&bytes, other_public).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidSignature);
}

#[test]
fn truncation_is_invalid_format() {
    let codec = LicenseCodec::default();
    let (private, public) = keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
    let bytes = codec.encode(&license, private).unwrap();

    for cut in [0, 3, 4, 20, bytes.len() / 2, bytes.len() - 1] {
        let err = codec.decode(&bytes[..cut], public).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFormat, "cut at {cut}");
    }
}

#[test]
fn trailing_bytes_are_invalid_format() {
    let codec = LicenseCodec::default();
    let (private, public) = keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
    let mut bytes = codec.encode(&license, private).unwrap();
    bytes.push(0x00);

    let err = codec.decode(&bytes, public).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFormat);
}

#[test]
fn oversized_declared_length_is_invalid_format() {
    // A single field claiming more bytes than the buffer holds.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1000u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);

    let err = Envelope::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFormat);
}

#[test]
fn decoded_features_survive_the_envelope() {
    let codec = LicenseCodec::default();
    let (private, public) = keypair();

    let license = License::Standard(StandardLicense::new("Acme", "John Doe"))
        .with_feature("Reports", FeatureValue::Boolean(true));
    let bytes = codec.encode(&license, private).unwrap();

    let decoded = codec.decode(&bytes, public).unwrap();
    assert!(decoded
        .info()
        .features
        .get("Reports")
        .is_some_and(FeatureValue::is_enabled));
}
