//! Contract risk and complexity analysis.
//!
//! The analyzer is a pure function of the contract: it never fails and the
//! same contract always yields the same [`ContractAnalysis`]. Its output
//! drives strategy selection and violation prioritization.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::{Classification, Contract};
use crate::patterns::is_sensitive_field_name;

/// Points per field, capped at [`FIELD_POINTS_CAP`].
const POINTS_PER_FIELD: f64 = 1.5;
const FIELD_POINTS_CAP: f64 = 30.0;

const POINTS_PER_PII_FIELD: f64 = 5.0;
const PII_POINTS_CAP: f64 = 20.0;

const POINTS_PER_COMPLIANCE_TAG: f64 = 10.0;
const COMPLIANCE_POINTS_CAP: f64 = 20.0;

const POINTS_PER_QUALITY_RULE: f64 = 3.0;
const QUALITY_POINTS_CAP: f64 = 15.0;

const MAX_COMPLEXITY: f64 = 100.0;

/// How much scrutiny a contract warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Risk and complexity profile of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAnalysis {
    pub risk_level: RiskLevel,

    /// 0-100 heuristic of schema and governance richness
    pub complexity_score: u8,

    pub has_pii: bool,

    /// PII, a sensitive classification, or sensitive-looking field names
    pub has_sensitive_data: bool,

    pub compliance_required: bool,
    pub classification: Classification,
    pub compliance_frameworks: Vec<String>,
    pub field_count: usize,
    pub pii_field_count: usize,
    pub concerns: Vec<String>,
}

/// Computes [`ContractAnalysis`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractAnalyzer;

impl ContractAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, contract: &Contract) -> ContractAnalysis {
        let governance = &contract.governance;
        let field_count = contract.fields.len();
        let pii_field_count = contract.pii_fields().count();
        let has_pii = pii_field_count > 0;
        let compliance_frameworks = governance.compliance_tags.clone();
        let compliance_required = !compliance_frameworks.is_empty();

        let has_sensitive_data = has_pii
            || governance.classification.is_sensitive()
            || contract
                .fields
                .iter()
                .any(|f| is_sensitive_field_name(&f.name));

        let complexity_score = complexity_score(contract);
        let risk_level = risk_level(
            governance.classification,
            compliance_frameworks.len(),
            has_pii,
            field_count,
            complexity_score,
        );

        let analysis = ContractAnalysis {
            risk_level,
            complexity_score,
            has_pii,
            has_sensitive_data,
            compliance_required,
            classification: governance.classification,
            compliance_frameworks,
            field_count,
            pii_field_count,
            concerns: concerns(contract, has_pii),
        };

        tracing::debug!(
            dataset = %contract.dataset.name,
            risk = %analysis.risk_level,
            complexity = analysis.complexity_score,
            "Contract analyzed"
        );

        analysis
    }
}

fn classification_points(classification: Classification) -> f64 {
    match classification {
        Classification::Public => 0.0,
        Classification::Internal => 5.0,
        Classification::Confidential => 10.0,
        Classification::Restricted => 15.0,
    }
}

/// Capped weighted sum, floored to an integer.
fn complexity_score(contract: &Contract) -> u8 {
    let fields = (contract.fields.len() as f64 * POINTS_PER_FIELD).min(FIELD_POINTS_CAP);
    let pii = (contract.pii_fields().count() as f64 * POINTS_PER_PII_FIELD).min(PII_POINTS_CAP);
    let compliance = (contract.governance.compliance_tags.len() as f64
        * POINTS_PER_COMPLIANCE_TAG)
        .min(COMPLIANCE_POINTS_CAP);
    let quality = (contract.quality.rule_count() as f64 * POINTS_PER_QUALITY_RULE)
        .min(QUALITY_POINTS_CAP);
    let classification = classification_points(contract.governance.classification);

    let total = (fields + pii + compliance + quality + classification).min(MAX_COMPLEXITY);
    total.floor() as u8
}

/// Decision table, first match wins.
fn risk_level(
    classification: Classification,
    compliance_tags: usize,
    has_pii: bool,
    field_count: usize,
    complexity: u8,
) -> RiskLevel {
    let confidential = classification == Classification::Confidential;

    if classification == Classification::Restricted || compliance_tags >= 3 {
        RiskLevel::Critical
    } else if confidential && (has_pii || compliance_tags > 0) {
        RiskLevel::High
    } else if compliance_tags >= 2 || complexity >= 70 {
        RiskLevel::High
    } else if has_pii || compliance_tags > 0 || confidential {
        RiskLevel::Medium
    } else if field_count > 15 || complexity >= 40 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn concerns(contract: &Contract, has_pii: bool) -> Vec<String> {
    let governance = &contract.governance;
    let mut concerns = Vec::new();

    if has_pii && !governance.encryption_required {
        concerns.push("PII fields without encryption".to_string());
    }
    if governance.classification.is_sensitive() && governance.retention_days.is_none() {
        concerns.push(format!(
            "{} data without a retention period",
            governance.classification
        ));
    }
    if has_pii && governance.approved_use_cases.is_empty() {
        concerns.push("PII without approved use cases".to_string());
    }
    if !governance.compliance_tags.is_empty() {
        concerns.push(format!(
            "Subject to compliance frameworks: {}",
            governance.compliance_tags.join(", ")
        ));
    }

    let unmarked: Vec<&str> = contract
        .fields
        .iter()
        .filter(|f| !f.pii && is_sensitive_field_name(&f.name))
        .map(|f| f.name.as_str())
        .collect();
    if !unmarked.is_empty() {
        concerns.push(format!(
            "Possibly sensitive fields not marked as PII: {}",
            unmarked.join(", ")
        ));
    }

    if contract.quality.rule_count() == 0 {
        concerns.push("No data quality rules defined".to_string());
    }

    concerns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldSpec;
    use proptest::prelude::*;

    fn contract_with(
        classification: Classification,
        fields: usize,
        pii_fields: usize,
        tags: &[&str],
    ) -> Contract {
        let mut contract = Contract::new("dataset", "owner");
        contract.governance.classification = classification;
        contract.governance.compliance_tags = tags.iter().map(|t| t.to_string()).collect();
        for i in 0..fields {
            let mut field = FieldSpec::new(format!("col_{}", i), "string");
            field.pii = i < pii_fields;
            contract.fields.push(field);
        }
        contract
    }

    #[test]
    fn test_public_small_contract_is_low() {
        let contract = contract_with(Classification::Public, 2, 0, &[]);
        let analysis = ContractAnalyzer::new().analyze(&contract);

        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.complexity_score, 3);
        assert!(!analysis.has_pii);
        assert!(!analysis.has_sensitive_data);
    }

    #[test]
    fn test_restricted_is_critical() {
        let contract = contract_with(Classification::Restricted, 1, 0, &[]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert!(analysis.has_sensitive_data);
    }

    #[test]
    fn test_three_tags_is_critical() {
        let contract = contract_with(Classification::Public, 1, 0, &["GDPR", "HIPAA", "SOX"]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_confidential_with_pii_is_high() {
        let contract = contract_with(Classification::Confidential, 4, 1, &["GDPR", "CCPA"]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis.compliance_required);
    }

    #[test]
    fn test_two_tags_is_high() {
        let contract = contract_with(Classification::Internal, 2, 0, &["SOX", "CCPA"]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_pii_alone_is_medium() {
        let contract = contract_with(Classification::Internal, 3, 1, &[]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert!(analysis
            .concerns
            .iter()
            .any(|c| c.contains("without encryption")));
    }

    #[test]
    fn test_many_fields_is_medium() {
        let contract = contract_with(Classification::Public, 16, 0, &[]);
        let analysis = ContractAnalyzer::new().analyze(&contract);
        assert_eq!(analysis.complexity_score, 24);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_complexity_components_are_capped() {
        let mut contract = contract_with(
            Classification::Restricted,
            40,
            10,
            &["GDPR", "HIPAA", "SOX", "PCI-DSS"],
        );
        contract.quality.completeness_threshold = Some(99.0);
        contract.quality.accuracy_threshold = Some(95.0);
        contract.quality.freshness_sla = Some("1h".to_string());
        contract.quality.uniqueness_fields = vec!["col_0".to_string()];

        let analysis = ContractAnalyzer::new().analyze(&contract);
        // 30 + 20 + 20 + 12 + 15
        assert_eq!(analysis.complexity_score, 97);
    }

    #[test]
    fn test_sensitive_field_name_sets_flag() {
        let mut contract = contract_with(Classification::Internal, 0, 0, &[]);
        contract.fields.push(FieldSpec::new("email_address", "string"));
        let analysis = ContractAnalyzer::new().analyze(&contract);

        assert!(!analysis.has_pii);
        assert!(analysis.has_sensitive_data);
        assert!(analysis
            .concerns
            .iter()
            .any(|c| c.contains("email_address")));
    }

    #[test]
    fn test_risk_table_order() {
        // Rule 1 beats rule 2
        assert_eq!(
            risk_level(Classification::Restricted, 0, true, 1, 0),
            RiskLevel::Critical
        );
        // Rule 3 via complexity
        assert_eq!(risk_level(Classification::Public, 0, false, 1, 70), RiskLevel::High);
        // Rule 5 via complexity
        assert_eq!(risk_level(Classification::Public, 0, false, 1, 40), RiskLevel::Medium);
        assert_eq!(risk_level(Classification::Internal, 0, false, 15, 39), RiskLevel::Low);
    }

    fn any_classification() -> impl proptest::strategy::Strategy<Value = Classification> {
        prop_oneof![
            Just(Classification::Public),
            Just(Classification::Internal),
            Just(Classification::Confidential),
            Just(Classification::Restricted),
        ]
    }

    proptest! {
        #[test]
        fn analysis_is_deterministic_and_bounded(
            classification in any_classification(),
            fields in 0usize..60,
            pii in 0usize..60,
            tags in proptest::collection::vec("[A-Z]{3,5}", 0..6),
        ) {
            let tag_refs: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
            let contract = contract_with(classification, fields, pii.min(fields), &tag_refs);
            let analyzer = ContractAnalyzer::new();

            let first = analyzer.analyze(&contract);
            let second = analyzer.analyze(&contract);

            prop_assert_eq!(&first, &second);
            prop_assert!(first.complexity_score <= 100);
        }
    }
}
