//! Validation rule and rule group contracts.

use std::sync::Arc;

use licensehub_core::types::params::ValidationParams;
use licensehub_entity::License;

use crate::outcome::ValidationOutcome;

/// A single validation check over a decoded license.
///
/// Rules are pure and synchronous; anything requiring I/O (seat counts,
/// store lookups) belongs to the server-side activation engine, not here.
pub trait ValidationRule: Send + Sync + 'static {
    /// Rule name, used in logs.
    fn name(&self) -> &str;

    /// Check `license` against `params`.
    fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome;
}

/// An ordered list of rules with an aggregate, short-circuiting validate.
#[derive(Clone, Default)]
pub struct RuleGroup {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl std::fmt::Debug for RuleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleGroup")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl RuleGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the group.
    pub fn push(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Builder-style append.
    pub fn with(mut self, rule: Arc<dyn ValidationRule>) -> Self {
        self.push(rule);
        self
    }

    /// Number of rules in the group.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the group has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order, returning the first non-valid outcome.
    pub fn validate(&self, license: &License, params: &ValidationParams) -> ValidationOutcome {
        for rule in &self.rules {
            let outcome = rule.validate(license, params);
            if !outcome.is_valid() {
                tracing::debug!(
                    rule = rule.name(),
                    license_id = %license.info().license_id,
                    status = ?outcome.status,
                    "Validation rule rejected license"
                );
                return outcome;
            }
        }
        ValidationOutcome::valid()
    }
}
