//! Typed operation results.
//!
//! The engine reports business outcomes through these enums rather than
//! aborting a worker; `AppError` is reserved for store and crypto
//! failures.

use licensehub_core::error::ErrorKind;

/// Outcome of server-side license validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The license is valid.
    Valid,
    /// The license expiry has passed (the row is marked accordingly).
    Expired,
    /// The license was revoked.
    Revoked,
    /// No license with the given key exists.
    NotFound,
    /// A cross-check between envelope, params, and the persisted row
    /// failed.
    Invalid {
        /// Specific failure kind.
        kind: ErrorKind,
        /// Human-readable cause.
        message: String,
    },
}

impl ValidationResult {
    /// Whether validation passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub(crate) fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of an activation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationResult {
    /// The license is active (a seat was taken for seat-counted
    /// variants).
    Activated,
    /// Every seat of a floating/concurrent license is in use.
    MaximumActivationsReached,
    /// Validation failed before activation was attempted.
    Rejected(ValidationResult),
}

/// Outcome of a revocation or seat release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivationResult {
    /// The license was revoked or the seat released.
    Deactivated,
    /// No matching license or activation.
    NotFound,
}

/// Outcome of a subscription renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalResult {
    /// Renewal applied; a fresh envelope for the extended license.
    Renewed {
        /// Encoded license envelope.
        envelope: Vec<u8>,
    },
    /// Renewal rejected.
    Rejected {
        /// Specific failure kind.
        kind: ErrorKind,
        /// Human-readable cause.
        message: String,
    },
}

impl RenewalResult {
    pub(crate) fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }
}
