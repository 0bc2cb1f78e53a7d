//! # licensehub-codec
//!
//! The self-authenticating license envelope: a four-field length-prefixed
//! binary container holding `hash | signature | ciphertext | aes_key`,
//! plus the pluggable text serializer that produces the encrypted payload.

pub mod envelope;
pub mod serializer;

pub use envelope::{Envelope, LicenseCodec};
pub use serializer::{JsonLicenseSerializer, LicenseSerializer};
