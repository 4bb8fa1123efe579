//! Sensitive-data checks.

use crate::contract::Contract;
use crate::patterns::{classify_field_name, SensitiveKind};

use super::Finding;

/// Compliance frameworks that mandate encryption at rest.
const REGULATED_FRAMEWORKS: [&str; 5] = ["GDPR", "HIPAA", "PCI-DSS", "SOX", "CCPA"];

pub(super) fn pii_encryption(contract: &Contract) -> Vec<Finding> {
    if contract.governance.encryption_required {
        return Vec::new();
    }

    contract
        .pii_fields()
        .map(|f| {
            Finding::on_field(
                &f.name,
                format!("PII field '{}' is stored without encryption", f.name),
            )
        })
        .collect()
}

pub(super) fn pii_classification(contract: &Contract) -> Vec<Finding> {
    let classification = contract.governance.classification;
    if !contract.has_pii() || classification.is_sensitive() {
        return Vec::new();
    }

    let count = contract.pii_fields().count();
    vec![Finding::dataset(format!(
        "Dataset contains {} PII field(s) but is classified {}",
        count, classification
    ))]
}

pub(super) fn sensitive_field_unmarked(contract: &Contract) -> Vec<Finding> {
    contract
        .fields
        .iter()
        .filter(|f| !f.pii)
        .filter_map(|f| {
            let kind = classify_field_name(&f.name)?;
            let what = match kind {
                SensitiveKind::Personal => "personal data",
                SensitiveKind::Health => "health data",
                SensitiveKind::Financial => "financial data",
                SensitiveKind::Credential => "a credential",
            };
            Some(Finding::on_field(
                &f.name,
                format!(
                    "Field '{}' looks like {} but is not marked as PII",
                    f.name, what
                ),
            ))
        })
        .collect()
}

pub(super) fn sensitive_retention(contract: &Contract) -> Vec<Finding> {
    let governance = &contract.governance;
    if !governance.classification.is_sensitive() || governance.retention_days.is_some() {
        return Vec::new();
    }

    vec![Finding::dataset(format!(
        "{} dataset has no retention period",
        capitalize(&governance.classification.to_string())
    ))]
}

pub(super) fn compliance_encryption(contract: &Contract) -> Vec<Finding> {
    if contract.governance.encryption_required {
        return Vec::new();
    }

    let regulated: Vec<&str> = REGULATED_FRAMEWORKS
        .iter()
        .copied()
        .filter(|tag| contract.has_compliance_tag(tag))
        .collect();

    if regulated.is_empty() {
        return Vec::new();
    }

    vec![Finding::dataset(format!(
        "Dataset is subject to {} but encryption is not required",
        regulated.join(", ")
    ))]
}

pub(super) fn pii_use_cases(contract: &Contract) -> Vec<Finding> {
    let has_use_case = contract
        .governance
        .approved_use_cases
        .iter()
        .any(|u| !u.trim().is_empty());

    if !contract.has_pii() || has_use_case {
        return Vec::new();
    }

    vec![Finding::dataset(
        "Dataset contains PII but declares no approved use cases",
    )]
}

pub(super) fn residency_for_gdpr(contract: &Contract) -> Vec<Finding> {
    let has_residency = contract
        .governance
        .data_residency
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());

    if !contract.has_compliance_tag("GDPR") || has_residency {
        return Vec::new();
    }

    vec![Finding::dataset(
        "GDPR-regulated dataset does not declare data residency",
    )]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
