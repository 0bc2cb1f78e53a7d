//! Result alias for the unified error type.

use crate::error::AppError;

/// Result alias used throughout LicenseHub.
pub type AppResult<T> = Result<T, AppError>;
