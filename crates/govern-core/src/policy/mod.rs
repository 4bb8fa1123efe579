//! Governance policies.
//!
//! A policy is either rule-based (a deterministic check evaluated in code)
//! or semantic (a natural-language rule evaluated by a language model).
//! Both share identity, severity and remediation; dispatch over the two is
//! exhaustive through [`Policy`].

mod catalog;

pub use catalog::{PolicyError, RuleCatalog, SemanticCatalog};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Severity;

/// Identity and reporting fields shared by every policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInfo {
    pub id: String,

    /// Human-readable label, used as the violation's source
    pub name: String,

    pub severity: Severity,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub remediation: String,
}

/// Deterministic checks the rule engine knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCheck {
    // Sensitive data
    PiiEncryption,
    PiiClassification,
    SensitiveFieldUnmarked,
    SensitiveRetention,
    ComplianceEncryption,
    PiiUseCases,
    ResidencyForGdpr,

    // Data quality
    ThresholdRange,
    CompletenessDefined,
    FreshnessSla,
    UniquenessFieldsExist,
    FieldBounds,

    // Schema governance
    OwnerRequired,
    UniqueFieldNames,
    FieldDescriptions,
    RequiredNotNullable,
}

/// Concern a rule check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleGroup {
    SensitiveData,
    DataQuality,
    SchemaGovernance,
}

impl RuleCheck {
    pub const ALL: [RuleCheck; 16] = [
        RuleCheck::PiiEncryption,
        RuleCheck::PiiClassification,
        RuleCheck::SensitiveFieldUnmarked,
        RuleCheck::SensitiveRetention,
        RuleCheck::ComplianceEncryption,
        RuleCheck::PiiUseCases,
        RuleCheck::ResidencyForGdpr,
        RuleCheck::ThresholdRange,
        RuleCheck::CompletenessDefined,
        RuleCheck::FreshnessSla,
        RuleCheck::UniquenessFieldsExist,
        RuleCheck::FieldBounds,
        RuleCheck::OwnerRequired,
        RuleCheck::UniqueFieldNames,
        RuleCheck::FieldDescriptions,
        RuleCheck::RequiredNotNullable,
    ];

    pub fn group(self) -> RuleGroup {
        match self {
            RuleCheck::PiiEncryption
            | RuleCheck::PiiClassification
            | RuleCheck::SensitiveFieldUnmarked
            | RuleCheck::SensitiveRetention
            | RuleCheck::ComplianceEncryption
            | RuleCheck::PiiUseCases
            | RuleCheck::ResidencyForGdpr => RuleGroup::SensitiveData,
            RuleCheck::ThresholdRange
            | RuleCheck::CompletenessDefined
            | RuleCheck::FreshnessSla
            | RuleCheck::UniquenessFieldsExist
            | RuleCheck::FieldBounds => RuleGroup::DataQuality,
            RuleCheck::OwnerRequired
            | RuleCheck::UniqueFieldNames
            | RuleCheck::FieldDescriptions
            | RuleCheck::RequiredNotNullable => RuleGroup::SchemaGovernance,
        }
    }
}

impl FromStr for RuleCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_string()))
            .map_err(|_| format!("unknown rule check '{}'", s))
    }
}

/// How a semantic policy's structured response is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticPolicyType {
    /// `{"findings": [{field, reason, confidence, severity?}]}`, confidence-gated
    SensitiveData,

    /// `{"compliant": bool, "issues": [{field?, issue, framework?, severity?, remediation?}]}`
    Compliance,

    /// `{"risks": [{field?, risk, confidence, severity?, mitigation?}]}`, confidence-gated
    RiskAssessment,

    /// `{"violations": [{field?, message, severity?, remediation?}]}`
    #[default]
    Generic,
}

impl SemanticPolicyType {
    /// Whether findings of this type carry a subjective confidence that must
    /// clear the configured threshold.
    pub fn is_confidence_gated(self) -> bool {
        matches!(
            self,
            SemanticPolicyType::SensitiveData | SemanticPolicyType::RiskAssessment
        )
    }
}

impl FromStr for SemanticPolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sensitive_data" => Ok(SemanticPolicyType::SensitiveData),
            "compliance" => Ok(SemanticPolicyType::Compliance),
            "risk_assessment" => Ok(SemanticPolicyType::RiskAssessment),
            "generic" => Ok(SemanticPolicyType::Generic),
            other => Err(format!("unknown semantic policy type '{}'", other)),
        }
    }
}

impl fmt::Display for SemanticPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticPolicyType::SensitiveData => write!(f, "sensitive_data"),
            SemanticPolicyType::Compliance => write!(f, "compliance"),
            SemanticPolicyType::RiskAssessment => write!(f, "risk_assessment"),
            SemanticPolicyType::Generic => write!(f, "generic"),
        }
    }
}

/// A deterministic, code-evaluated policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleBasedPolicy {
    #[serde(flatten)]
    pub info: PolicyInfo,
    pub rule: RuleCheck,
}

/// A natural-language policy evaluated by a language model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticPolicy {
    #[serde(flatten)]
    pub info: PolicyInfo,

    /// The governance rule in plain language
    pub rule_text: String,

    /// Prompt with `{placeholder}` slots for contract context
    pub prompt_template: String,

    pub policy_type: SemanticPolicyType,
}

/// Either kind of policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    RuleBased(RuleBasedPolicy),
    Semantic(SemanticPolicy),
}

impl Policy {
    pub fn info(&self) -> &PolicyInfo {
        match self {
            Policy::RuleBased(p) => &p.info,
            Policy::Semantic(p) => &p.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn severity(&self) -> Severity {
        self.info().severity
    }
}
