//! The validation rule registry.

use std::collections::HashMap;
use std::sync::Arc;

use licensehub_core::traits::HardwareIdentifier;
use licensehub_core::types::params::ValidationParams;
use licensehub_entity::{License, LicenseType};

use crate::builtin::builtin_group;
use crate::outcome::ValidationOutcome;
use crate::rule::{RuleGroup, ValidationRule};

/// Holds the ordered global rules and the per-variant rule groups.
///
/// Built-in groups cover the standard validity checks for each variant;
/// user rules and user groups extend them. All registration happens during
/// setup, before the first validation runs; afterwards the registry is
/// read-only and shared by reference.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    global: RuleGroup,
    builtin: HashMap<LicenseType, RuleGroup>,
    user_groups: HashMap<LicenseType, RuleGroup>,
    built_in_enabled: bool,
}

impl RuleRegistry {
    /// Create a registry with the built-in groups for every variant.
    pub fn new(hardware: Arc<dyn HardwareIdentifier>) -> Self {
        let mut builtin = HashMap::new();
        for license_type in [
            LicenseType::Standard,
            LicenseType::Trial,
            LicenseType::NodeLocked,
            LicenseType::Subscription,
            LicenseType::Floating,
            LicenseType::Concurrent,
        ] {
            builtin.insert(license_type, builtin_group(license_type, hardware.clone()));
        }

        Self {
            global: RuleGroup::new(),
            builtin,
            user_groups: HashMap::new(),
            built_in_enabled: true,
        }
    }

    /// Enable or disable the built-in groups. When disabled, only global
    /// and user rules run.
    pub fn set_built_in_enabled(&mut self, enabled: bool) {
        self.built_in_enabled = enabled;
    }

    /// Whether built-in groups are enabled.
    pub fn built_in_enabled(&self) -> bool {
        self.built_in_enabled
    }

    /// Register a rule that runs for every license, in registration order.
    pub fn add_global_rule(&mut self, rule: Arc<dyn ValidationRule>) {
        self.global.push(rule);
    }

    /// Register a user rule for one license variant.
    pub fn add_rule_for(&mut self, license_type: LicenseType, rule: Arc<dyn ValidationRule>) {
        self.user_groups.entry(license_type).or_default().push(rule);
    }

    /// Replace the user rule group for one variant.
    pub fn set_group_for(&mut self, license_type: LicenseType, group: RuleGroup) {
        self.user_groups.insert(license_type, group);
    }

    /// Validate a license: global rules, then the built-in group (when
    /// enabled), then the user group. Short-circuits on the first
    /// non-valid outcome.
    pub fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome {
        let outcome = self.global.validate(license, params);
        if !outcome.is_valid() {
            return outcome;
        }

        let license_type = license.license_type();

        if self.built_in_enabled {
            if let Some(group) = self.builtin.get(&license_type) {
                let outcome = group.validate(license, params);
                if !outcome.is_valid() {
                    return outcome;
                }
            }
        }

        if let Some(group) = self.user_groups.get(&license_type) {
            let outcome = group.validate(license, params);
            if !outcome.is_valid() {
                return outcome;
            }
        }

        ValidationOutcome::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licensehub_core::error::AppError;
    use licensehub_entity::StandardLicense;

    struct AcceptAllHardware;

    impl HardwareIdentifier for AcceptAllHardware {
        fn get(&self) -> String {
            "test-machine".to_string()
        }

        fn validate(&self, _candidate: &str) -> bool {
            true
        }
    }

    /// Rejects every license; used to check ordering and short-circuit.
    struct RejectRule;

    impl ValidationRule for RejectRule {
        fn name(&self) -> &str {
            "reject"
        }

        fn validate(&self, _: &License, _: &ValidationParams) -> ValidationOutcome {
            ValidationOutcome::invalid(AppError::validation("rejected by custom rule"))
        }
    }

    fn registry() -> RuleRegistry {
        RuleRegistry::new(Arc::new(AcceptAllHardware))
    }

    fn standard() -> (License, ValidationParams) {
        let license = License::Standard(StandardLicense::new("Acme", "John Doe"));
        let params = ValidationParams::new()
            .with_user_name("John Doe")
            .with_license_key(license.license_key());
        (license, params)
    }

    #[test]
    fn builtin_validation_passes_matching_standard() {
        let (license, params) = standard();
        assert!(registry().validate(&license, &params).is_valid());
    }

    #[test]
    fn user_rule_runs_after_builtin() {
        let (license, params) = standard();
        let mut registry = registry();
        registry.add_rule_for(LicenseType::Standard, Arc::new(RejectRule));

        let outcome = registry.validate(&license, &params);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn disabling_builtin_skips_variant_checks() {
        let (license, _) = standard();
        let mut registry = registry();
        registry.set_built_in_enabled(false);

        // Empty params would fail the built-in user/key match.
        let outcome = registry.validate(&license, &ValidationParams::new());
        assert!(outcome.is_valid());
    }

    #[test]
    fn global_rules_short_circuit_everything() {
        let (license, params) = standard();
        let mut registry = registry();
        registry.add_global_rule(Arc::new(RejectRule));

        let outcome = registry.validate(&license, &params);
        assert_eq!(outcome.error.unwrap().message, "rejected by custom rule");
    }
}
