//! Validation outcomes.

use licensehub_core::error::AppError;

/// Result status of a validation rule or rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStatus {
    /// All checks passed.
    Valid,
    /// A check failed.
    Invalid,
    /// A time-based check failed.
    Expired,
    /// The license is revoked.
    Revoked,
}

/// Outcome of a single rule, or of a short-circuited group run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Final status.
    pub status: ValidationStatus,
    /// Cause, for non-valid statuses.
    pub error: Option<AppError>,
}

impl ValidationOutcome {
    /// A passing outcome.
    pub fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            error: None,
        }
    }

    /// A failing outcome.
    pub fn invalid(error: AppError) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            error: Some(error),
        }
    }

    /// An expired outcome.
    pub fn expired(error: AppError) -> Self {
        Self {
            status: ValidationStatus::Expired,
            error: Some(error),
        }
    }

    /// A revoked outcome.
    pub fn revoked(error: AppError) -> Self {
        Self {
            status: ValidationStatus::Revoked,
            error: Some(error),
        }
    }

    /// Whether this outcome passes.
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}
