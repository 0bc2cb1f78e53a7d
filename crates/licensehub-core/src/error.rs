//! Unified application error types for LicenseHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization used across the entire library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested license, activation, or entity was not found.
    NotFound,
    /// A precondition of generate/renew was violated.
    BadRequest,
    /// A validation rule rejected the license.
    Validation,
    /// The envelope signature or integrity check failed (tampered envelope).
    InvalidSignature,
    /// The envelope framing was bad, the payload could not be parsed, or
    /// the variant discriminator was unknown.
    InvalidFormat,
    /// Time-based expiry or trial period elapsed.
    Expired,
    /// A node-locked hardware identifier did not match.
    HardwareMismatch,
    /// A standard license user or key did not match.
    UserMismatch,
    /// The concurrent/floating seat cap was reached.
    SeatLimit,
    /// A required feature is missing or disabled in the current license.
    FeatureNotLicensed,
    /// The secrets file was corrupt, missing, or undecryptable.
    KeyManagement,
    /// An online heartbeat or disconnect call failed.
    Heartbeat,
    /// A cryptographic primitive failed.
    Crypto,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A file I/O error occurred.
    Io,
    /// A configuration error occurred.
    Configuration,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::InvalidSignature => write!(f, "INVALID_SIGNATURE"),
            Self::InvalidFormat => write!(f, "INVALID_FORMAT"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::HardwareMismatch => write!(f, "HARDWARE_MISMATCH"),
            Self::UserMismatch => write!(f, "USER_MISMATCH"),
            Self::SeatLimit => write!(f, "SEAT_LIMIT"),
            Self::FeatureNotLicensed => write!(f, "FEATURE_NOT_LICENSED"),
            Self::KeyManagement => write!(f, "KEY_MANAGEMENT"),
            Self::Heartbeat => write!(f, "HEARTBEAT"),
            Self::Crypto => write!(f, "CRYPTO"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Io => write!(f, "IO"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout LicenseHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire library boundary. Cryptographic failures never carry key
/// material in their messages.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an invalid-signature error.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSignature, message)
    }

    /// Create an invalid-format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat, message)
    }

    /// Create an expired-license error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a hardware-mismatch error.
    pub fn hardware_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HardwareMismatch, message)
    }

    /// Create a user-mismatch error.
    pub fn user_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserMismatch, message)
    }

    /// Create a seat-limit error.
    pub fn seat_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SeatLimit, message)
    }

    /// Create a feature-not-licensed error.
    pub fn feature_not_licensed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FeatureNotLicensed, message)
    }

    /// Create a key-management error.
    pub fn key_management(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyManagement, message)
    }

    /// Create a heartbeat error.
    pub fn heartbeat(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Heartbeat, message)
    }

    /// Create a crypto error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Crypto, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
