//! Schema-governance checks.

use std::collections::HashMap;

use crate::contract::Contract;

use super::Finding;

pub(super) fn owner_required(contract: &Contract) -> Vec<Finding> {
    if !contract.dataset.owner.trim().is_empty() {
        return Vec::new();
    }
    vec![Finding::dataset(format!(
        "Dataset '{}' has no owner",
        contract.dataset.name
    ))]
}

/// One finding per duplicated name, in order of first appearance.
pub(super) fn unique_field_names(contract: &Contract) -> Vec<Finding> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();

    for field in &contract.fields {
        let count = counts.entry(field.name.as_str()).or_insert(0);
        if *count == 0 {
            order.push(field.name.as_str());
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|name| counts[name] > 1)
        .map(|name| {
            Finding::on_field(
                name,
                format!("Field name '{}' is declared {} times", name, counts[name]),
            )
        })
        .collect()
}

pub(super) fn field_descriptions(contract: &Contract) -> Vec<Finding> {
    contract
        .fields
        .iter()
        .filter(|f| !f.has_description())
        .map(|f| Finding::on_field(&f.name, format!("Field '{}' has no description", f.name)))
        .collect()
}

pub(super) fn required_not_nullable(contract: &Contract) -> Vec<Finding> {
    contract
        .fields
        .iter()
        .filter(|f| f.required && f.nullable)
        .map(|f| {
            Finding::on_field(
                &f.name,
                format!("Field '{}' is required but nullable", f.name),
            )
        })
        .collect()
}
