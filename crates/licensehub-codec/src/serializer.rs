//! Pluggable license text serializer.

use licensehub_core::error::AppError;
use licensehub_core::AppResult;
use licensehub_entity::License;

/// Serializes licenses to a stable textual encoding and back.
///
/// The encoding must carry a `Type` discriminator naming the variant and
/// preserve every variant-specific field plus the feature tagged-union
/// encoding. Implementations should pin field ordering and timestamp
/// formatting so envelopes bit-match across platforms.
pub trait LicenseSerializer: Send + Sync + 'static {
    /// Encode a license as text.
    fn serialize(&self, license: &License) -> AppResult<String>;

    /// Decode a license from text, dispatching on the discriminator.
    fn deserialize(&self, payload: &str) -> AppResult<License>;
}

/// Default serializer: JSON with the `Type` discriminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLicenseSerializer;

impl LicenseSerializer for JsonLicenseSerializer {
    fn serialize(&self, license: &License) -> AppResult<String> {
        serde_json::to_string(license)
            .map_err(|e| AppError::invalid_format(format!("license serialization failed: {e}")))
    }

    fn deserialize(&self, payload: &str) -> AppResult<License> {
        serde_json::from_str(payload)
            .map_err(|e| AppError::invalid_format(format!("license payload rejected: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licensehub_entity::StandardLicense;

    #[test]
    fn serializer_round_trip() {
        let serializer = JsonLicenseSerializer;
        let license = License::Standard(StandardLicense::new("Acme", "John Doe"));

        let text = serializer.serialize(&license).unwrap();
        let back = serializer.deserialize(&text).unwrap();

        assert_eq!(license, back);
    }

    #[test]
    fn unknown_discriminator_is_invalid_format() {
        let serializer = JsonLicenseSerializer;
        let result = serializer.deserialize(r#"{"Type":"SiteWide","issuer":"Acme"}"#);

        let err = result.unwrap_err();
        assert_eq!(err.kind, licensehub_core::error::ErrorKind::InvalidFormat);
    }

    #[test]
    fn serialization_is_deterministic() {
        let serializer = JsonLicenseSerializer;
        let license = License::Standard(StandardLicense::new("Acme", "John Doe"));

        let a = serializer.serialize(&license).unwrap();
        let b = serializer.serialize(&license).unwrap();
        assert_eq!(a, b);
    }
}
