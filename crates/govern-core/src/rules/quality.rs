//! Data-quality checks.

use crate::contract::Contract;

use super::Finding;

pub(super) fn threshold_range(contract: &Contract) -> Vec<Finding> {
    let quality = &contract.quality;
    [
        ("Completeness", quality.completeness_threshold),
        ("Accuracy", quality.accuracy_threshold),
    ]
    .into_iter()
    .filter_map(|(label, threshold)| {
        let value = threshold?;
        if (0.0..=100.0).contains(&value) {
            return None;
        }
        Some(Finding::dataset(format!(
            "{} threshold {} is outside 0-100",
            label, value
        )))
    })
    .collect()
}

pub(super) fn completeness_defined(contract: &Contract) -> Vec<Finding> {
    let required = contract.fields.iter().filter(|f| f.required).count();
    if required == 0 || contract.quality.completeness_threshold.is_some() {
        return Vec::new();
    }

    vec![Finding::dataset(format!(
        "{} required field(s) declared but no completeness threshold",
        required
    ))]
}

pub(super) fn freshness_sla(contract: &Contract) -> Vec<Finding> {
    match contract.quality.freshness_sla.as_deref().map(str::trim) {
        None | Some("") => vec![Finding::dataset("No freshness SLA declared")],
        Some(sla) => match humantime::parse_duration(sla) {
            Ok(_) => Vec::new(),
            Err(e) => vec![Finding::dataset(format!(
                "Freshness SLA '{}' is not a valid duration: {}",
                sla, e
            ))],
        },
    }
}

pub(super) fn uniqueness_fields_exist(contract: &Contract) -> Vec<Finding> {
    contract
        .quality
        .uniqueness_fields
        .iter()
        .filter(|name| contract.field(name).is_none())
        .map(|name| {
            Finding::on_field(
                name,
                format!("Uniqueness constraint references unknown field '{}'", name),
            )
        })
        .collect()
}

pub(super) fn field_bounds(contract: &Contract) -> Vec<Finding> {
    let mut findings = Vec::new();

    for field in &contract.fields {
        let mut problems = Vec::new();

        if let (Some(min), Some(max)) = (field.min_value, field.max_value) {
            if min > max {
                problems.push(format!("min_value {} exceeds max_value {}", min, max));
            }
        }
        if field.max_length == Some(0) {
            problems.push("max_length is zero".to_string());
        }

        if !problems.is_empty() {
            findings.push(Finding::on_field(
                &field.name,
                format!("Field '{}': {}", field.name, problems.join("; ")),
            ));
        }
    }

    findings
}
