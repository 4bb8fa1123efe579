//! Shared result types for contract validation.
//!
//! A [`ValidationResult`] can only be built from a list of violations, so its
//! status and counters always agree with the violations it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analyzer::RiskLevel;
use crate::strategy::Strategy;

/// Severity of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "critical")]
    Critical,
    #[serde(alias = "warning")]
    Warning,
    #[serde(alias = "info")]
    Info,
}

impl Severity {
    /// Sort rank: lower ranks come first in merged output.
    pub fn rank(self) -> i32 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts the canonical names plus the looser vocabulary language
    /// models tend to answer with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "high" | "error" | "blocker" => Ok(Severity::Critical),
            "warning" | "warn" | "medium" | "moderate" => Ok(Severity::Warning),
            "info" | "low" | "informational" | "notice" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Which engine produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    RuleBased,
    Semantic,
}

/// One finding against a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,

    /// Human-readable label of the policy that produced this finding
    pub policy: String,

    /// Identifier of the policy in its catalog
    pub policy_id: String,

    /// Field the finding refers to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub message: String,

    #[serde(default)]
    pub remediation: String,

    pub engine: EngineKind,
}

impl Violation {
    /// Attach a field reference.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Passed,
    Warning,
    Failed,
}

impl ValidationStatus {
    /// Status implied by a set of violations.
    pub fn from_violations(violations: &[Violation]) -> Self {
        if violations.iter().any(|v| v.severity == Severity::Critical) {
            ValidationStatus::Failed
        } else if violations.iter().any(|v| v.severity == Severity::Warning) {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Passed
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Passed => write!(f, "PASSED"),
            ValidationStatus::Warning => write!(f, "WARNING"),
            ValidationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Raw output of one engine before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReport {
    pub engine: EngineKind,
    pub violations: Vec<Violation>,

    /// Policies evaluated without producing a violation
    pub passed: usize,
}

impl EngineReport {
    pub fn new(engine: EngineKind, violations: Vec<Violation>, passed: usize) -> Self {
        Self {
            engine,
            violations,
            passed,
        }
    }

    pub fn empty(engine: EngineKind) -> Self {
        Self::new(engine, Vec::new(), 0)
    }
}

/// Orchestration details attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub strategy: Strategy,
    pub risk_level: RiskLevel,
    pub complexity_score: u8,
    pub reasoning: String,
    pub estimated_seconds: f64,

    #[serde(default)]
    pub semantic_policies: Vec<String>,

    /// True when semantic assessment was requested but skipped because the
    /// backend was unavailable
    #[serde(default)]
    pub semantic_degraded: bool,
}

/// The merged, aggregated outcome of validating one contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    status: ValidationStatus,
    passed: usize,
    warnings: usize,
    failures: usize,
    violations: Vec<Violation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ValidationMetadata>,

    evaluated_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Build a result, deriving status and counters from the violations.
    pub fn from_violations(violations: Vec<Violation>, passed: usize) -> Self {
        let failures = violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .count();
        let warnings = violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count();

        Self {
            status: ValidationStatus::from_violations(&violations),
            passed,
            warnings,
            failures,
            violations,
            metadata: None,
            evaluated_at: Utc::now(),
        }
    }

    /// Empty passing result.
    pub fn passing() -> Self {
        Self::from_violations(Vec::new(), 0)
    }

    pub fn with_metadata(mut self, metadata: ValidationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn metadata(&self) -> Option<&ValidationMetadata> {
        self.metadata.as_ref()
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}

impl From<EngineReport> for ValidationResult {
    fn from(report: EngineReport) -> Self {
        Self::from_violations(report.violations, report.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn violation(severity: Severity) -> Violation {
        Violation {
            severity,
            policy: "Test Policy".to_string(),
            policy_id: "T1".to_string(),
            field: None,
            message: "test".to_string(),
            remediation: String::new(),
            engine: EngineKind::RuleBased,
        }
    }

    #[test]
    fn test_empty_result_passes() {
        let result = ValidationResult::passing();
        assert_eq!(result.status(), ValidationStatus::Passed);
        assert_eq!(result.failures(), 0);
        assert_eq!(result.warnings(), 0);
    }

    #[test]
    fn test_critical_fails() {
        let result = ValidationResult::from_violations(
            vec![violation(Severity::Warning), violation(Severity::Critical)],
            3,
        );
        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(result.failures(), 1);
        assert_eq!(result.warnings(), 1);
        assert_eq!(result.passed(), 3);
    }

    #[test]
    fn test_info_only_passes() {
        let result = ValidationResult::from_violations(vec![violation(Severity::Info)], 0);
        assert_eq!(result.status(), ValidationStatus::Passed);
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("medium".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(" low ".parse::<Severity>().unwrap(), Severity::Info);
        assert!("catastrophic".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_accepts_lowercase() {
        let s: Severity = serde_yaml::from_str("critical").unwrap();
        assert_eq!(s, Severity::Critical);
        let s: Severity = serde_yaml::from_str("WARNING").unwrap();
        assert_eq!(s, Severity::Warning);
    }

    fn any_severity() -> impl proptest::strategy::Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Critical),
            Just(Severity::Warning),
            Just(Severity::Info),
        ]
    }

    proptest! {
        #[test]
        fn status_matches_violation_counts(
            severities in proptest::collection::vec(any_severity(), 0..20),
            passed in 0usize..50,
        ) {
            let violations: Vec<_> = severities.iter().map(|s| violation(*s)).collect();
            let result = ValidationResult::from_violations(violations, passed);

            match result.status() {
                ValidationStatus::Failed => prop_assert!(result.failures() > 0),
                ValidationStatus::Warning => {
                    prop_assert_eq!(result.failures(), 0);
                    prop_assert!(result.warnings() > 0);
                }
                ValidationStatus::Passed => {
                    prop_assert_eq!(result.failures(), 0);
                    prop_assert_eq!(result.warnings(), 0);
                }
            }
            prop_assert_eq!(
                result.failures(),
                severities.iter().filter(|s| **s == Severity::Critical).count()
            );
        }
    }
}
