//! Built-in per-variant validation rules.

use std::sync::Arc;

use chrono::Utc;

use licensehub_core::error::AppError;
use licensehub_core::traits::HardwareIdentifier;
use licensehub_core::types::params::ValidationParams;
use licensehub_entity::{License, LicenseType};

use crate::outcome::ValidationOutcome;
use crate::rule::{RuleGroup, ValidationRule};

/// Rejects licenses whose expiry has passed. Absent expiry passes.
pub struct ExpirationRule;

impl ValidationRule for ExpirationRule {
    fn name(&self) -> &str {
        "expiration"
    }

    fn validate(&self, license: &License, _params: &ValidationParams) -> ValidationOutcome {
        match license.info().expiration_date {
            Some(expiry) if expiry <= Utc::now() => ValidationOutcome::expired(
                AppError::expired(format!("license expired on {expiry}")),
            ),
            _ => ValidationOutcome::valid(),
        }
    }
}

/// Standard licenses: the user name and license key must both match the
/// caller's parameters.
pub struct UserKeyMatchRule;

impl ValidationRule for UserKeyMatchRule {
    fn name(&self) -> &str {
        "user_key_match"
    }

    fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome {
        let user_matches = params.user_name.as_deref() == license.user_name();
        let key_matches = params.license_key.as_deref() == Some(license.license_key());

        if user_matches && key_matches {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid(AppError::user_mismatch(
                "user name or license key does not match",
            ))
        }
    }
}

/// Trial licenses: positive trial period, window not yet elapsed.
pub struct TrialWindowRule;

impl ValidationRule for TrialWindowRule {
    fn name(&self) -> &str {
        "trial_window"
    }

    fn validate(&self, license: &License, _params: &ValidationParams) -> ValidationOutcome {
        let License::Trial(trial) = license else {
            return ValidationOutcome::invalid(AppError::validation("not a trial license"));
        };

        if trial.trial_period.num_seconds() <= 0 {
            return ValidationOutcome::invalid(AppError::validation(
                "trial period must be positive",
            ));
        }

        let now = Utc::now();
        let window_end = trial.info.issued_on + trial.trial_period;
        let expired = trial.info.expiration_date.is_some_and(|e| e <= now) || window_end <= now;

        if expired {
            ValidationOutcome::expired(AppError::expired("trial period elapsed"))
        } else {
            ValidationOutcome::valid()
        }
    }
}

/// Node-locked licenses: the fingerprint must identify this machine.
///
/// The caller-supplied hardware id takes precedence; the one embedded in
/// the license is the fallback.
pub struct HardwareBindingRule {
    hardware: Arc<dyn HardwareIdentifier>,
}

impl HardwareBindingRule {
    pub fn new(hardware: Arc<dyn HardwareIdentifier>) -> Self {
        Self { hardware }
    }
}

impl ValidationRule for HardwareBindingRule {
    fn name(&self) -> &str {
        "hardware_binding"
    }

    fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome {
        let candidate = params
            .hardware_id
            .as_deref()
            .or_else(|| license.hardware_id());

        match candidate {
            Some(id) if self.hardware.validate(id) => ValidationOutcome::valid(),
            Some(_) => ValidationOutcome::invalid(AppError::hardware_mismatch(
                "hardware identifier does not match this machine",
            )),
            None => ValidationOutcome::invalid(AppError::hardware_mismatch(
                "no hardware identifier to validate",
            )),
        }
    }
}

/// Subscription licenses: the window must extend past now and the expiry
/// must equal `start + duration`.
pub struct SubscriptionWindowRule;

impl ValidationRule for SubscriptionWindowRule {
    fn name(&self) -> &str {
        "subscription_window"
    }

    fn validate(&self, license: &License, _params: &ValidationParams) -> ValidationOutcome {
        let License::Subscription(sub) = license else {
            return ValidationOutcome::invalid(AppError::validation("not a subscription license"));
        };

        let window_end = sub.subscription_start_date + sub.subscription_duration;

        if sub.info.expiration_date != Some(window_end) {
            return ValidationOutcome::invalid(AppError::validation(
                "subscription expiry does not equal start plus duration",
            ));
        }

        if window_end <= Utc::now() {
            ValidationOutcome::expired(AppError::expired("subscription window elapsed"))
        } else {
            ValidationOutcome::valid()
        }
    }
}

/// Floating/concurrent licenses: the user name and seat cap must match
/// the caller's parameters.
pub struct SeatParamsRule;

impl ValidationRule for SeatParamsRule {
    fn name(&self) -> &str {
        "seat_params"
    }

    fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome {
        let user_matches = params.user_name.as_deref() == license.user_name();
        let cap_matches = params.max_active_users_count == license.max_active_users_count();

        if user_matches && cap_matches {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid(AppError::user_mismatch(
                "user name or seat cap does not match",
            ))
        }
    }
}

/// Build the built-in rule group for one license variant.
pub fn builtin_group(
    license_type: LicenseType,
    hardware: Arc<dyn HardwareIdentifier>,
) -> RuleGroup {
    match license_type {
        LicenseType::Standard => RuleGroup::new()
            .with(Arc::new(ExpirationRule))
            .with(Arc::new(UserKeyMatchRule)),
        LicenseType::Trial => RuleGroup::new().with(Arc::new(TrialWindowRule)),
        LicenseType::NodeLocked => RuleGroup::new()
            .with(Arc::new(ExpirationRule))
            .with(Arc::new(HardwareBindingRule::new(hardware))),
        LicenseType::Subscription => RuleGroup::new().with(Arc::new(SubscriptionWindowRule)),
        LicenseType::Floating | LicenseType::Concurrent => {
            RuleGroup::new().with(Arc::new(SeatParamsRule))
        }
    }
}
