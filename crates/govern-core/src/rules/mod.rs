//! Rule Evaluation Engine
//!
//! Evaluates a contract against the rule-based catalog. Every check is a
//! pure function of the contract; the engine attaches the catalog entry's
//! severity, label and remediation to what the check finds.

mod governance;
mod quality;
mod sensitive;

use std::sync::Arc;

use crate::contract::Contract;
use crate::policy::{PolicyError, RuleBasedPolicy, RuleCatalog, RuleCheck};
use crate::types::{EngineKind, EngineReport, ValidationResult, Violation};

/// What a single check found, before catalog metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Finding {
    pub field: Option<String>,
    pub message: String,
}

impl Finding {
    fn dataset(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    fn on_field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    fn into_violation(self, policy: &RuleBasedPolicy) -> Violation {
        Violation {
            severity: policy.info.severity,
            policy: policy.info.name.clone(),
            policy_id: policy.info.id.clone(),
            field: self.field,
            message: self.message,
            remediation: policy.info.remediation.clone(),
            engine: EngineKind::RuleBased,
        }
    }
}

/// Run one check.
fn run_check(check: RuleCheck, contract: &Contract) -> Vec<Finding> {
    match check {
        RuleCheck::PiiEncryption => sensitive::pii_encryption(contract),
        RuleCheck::PiiClassification => sensitive::pii_classification(contract),
        RuleCheck::SensitiveFieldUnmarked => sensitive::sensitive_field_unmarked(contract),
        RuleCheck::SensitiveRetention => sensitive::sensitive_retention(contract),
        RuleCheck::ComplianceEncryption => sensitive::compliance_encryption(contract),
        RuleCheck::PiiUseCases => sensitive::pii_use_cases(contract),
        RuleCheck::ResidencyForGdpr => sensitive::residency_for_gdpr(contract),

        RuleCheck::ThresholdRange => quality::threshold_range(contract),
        RuleCheck::CompletenessDefined => quality::completeness_defined(contract),
        RuleCheck::FreshnessSla => quality::freshness_sla(contract),
        RuleCheck::UniquenessFieldsExist => quality::uniqueness_fields_exist(contract),
        RuleCheck::FieldBounds => quality::field_bounds(contract),

        RuleCheck::OwnerRequired => governance::owner_required(contract),
        RuleCheck::UniqueFieldNames => governance::unique_field_names(contract),
        RuleCheck::FieldDescriptions => governance::field_descriptions(contract),
        RuleCheck::RequiredNotNullable => governance::required_not_nullable(contract),
    }
}

/// Deterministic rule engine over a shared catalog.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    catalog: Arc<RuleCatalog>,
}

impl RuleEngine {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    /// Engine over the embedded default catalog.
    pub fn builtin() -> Result<Self, PolicyError> {
        Ok(Self::new(Arc::new(RuleCatalog::builtin()?)))
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Evaluate every catalog policy against the contract.
    ///
    /// Violations keep catalog order. `passed` is the catalog size minus the
    /// violation count, saturating at 0.
    pub fn evaluate(&self, contract: &Contract) -> EngineReport {
        let mut violations = Vec::new();

        for policy in self.catalog.policies() {
            let findings = run_check(policy.rule, contract);
            if findings.is_empty() {
                continue;
            }

            tracing::debug!(
                policy = %policy.info.id,
                count = findings.len(),
                "Rule policy produced violations"
            );
            violations.extend(findings.into_iter().map(|f| f.into_violation(policy)));
        }

        let passed = self.catalog.len().saturating_sub(violations.len());
        EngineReport::new(EngineKind::RuleBased, violations, passed)
    }
}

/// Evaluate a contract with rules only.
pub fn validate_rules(contract: &Contract, catalog: &Arc<RuleCatalog>) -> ValidationResult {
    RuleEngine::new(Arc::clone(catalog)).evaluate(contract).into()
}
