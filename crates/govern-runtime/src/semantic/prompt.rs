//! Prompt construction for semantic policies.
//!
//! Every call shares one governance system prompt; the per-policy template
//! is filled with context derived from the contract.

use govern_core::Contract;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
}

/// System prompt shared by every semantic policy call.
///
/// Frames the model as a reviewer applying one stated rule, not a general
/// critic, and pins the output to JSON.
pub const GOVERNANCE_SYSTEM_PROMPT: &str = r#"
You are a Data Governance Reviewer assessing a data contract.

Your role is to check the contract against ONE stated governance rule.
You do not review overall quality.
You do not invent additional rules.
You do not report issues you cannot tie to a specific part of the contract.

## Review Constraints
1. Assess ONLY the rule you are given
2. Reference the specific field or governance setting for every finding
3. Report a confidence (0-100) wherever the response format asks for one
4. An empty result is a valid outcome when the contract satisfies the rule

## Severity Vocabulary
- critical: the contract violates the rule in a way that exposes data or breaks a legal obligation
- warning: the contract is likely non-compliant or incomplete
- info: an improvement that does not block use of the dataset

## Output
Respond with a single JSON object in exactly the format the request describes.
Do not add commentary outside the JSON.
"#;

const NONE: &str = "none";
const UNSPECIFIED: &str = "unspecified";

/// Contract-derived values for template placeholders.
#[derive(Debug, Clone)]
pub struct PromptContext {
    values: Vec<(&'static str, String)>,
}

impl PromptContext {
    pub fn from_contract(contract: &Contract) -> Self {
        let dataset = &contract.dataset;
        let governance = &contract.governance;

        let values = vec![
            ("dataset_name", dataset.name.clone()),
            ("owner", non_empty_or(&dataset.owner, UNSPECIFIED)),
            (
                "description",
                non_empty_or(dataset.description.as_deref().unwrap_or(""), UNSPECIFIED),
            ),
            ("classification", governance.classification.to_string()),
            ("fields", field_lines(contract)),
            ("field_summary", field_summary(contract)),
            ("field_count", contract.fields.len().to_string()),
            (
                "pii_fields",
                join_or_none(contract.pii_fields().map(|f| f.name.as_str())),
            ),
            ("quality_rules", quality_summary(contract)),
            (
                "compliance_tags",
                join_or_none(governance.compliance_tags.iter().map(String::as_str)),
            ),
            (
                "approved_use_cases",
                join_or_none(governance.approved_use_cases.iter().map(String::as_str)),
            ),
            (
                "data_residency",
                non_empty_or(governance.data_residency.as_deref().unwrap_or(""), UNSPECIFIED),
            ),
            (
                "retention_days",
                governance
                    .retention_days
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| UNSPECIFIED.to_string()),
            ),
            ("encryption_required", governance.encryption_required.to_string()),
        ];

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Fill `{placeholder}` slots in `template`. `{rule}` takes the policy's
    /// rule text; unknown placeholders and literal JSON braces are left as-is.
    /// Substituted values are never scanned again.
    pub fn render(&self, template: &str, rule_text: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match &caps[1] {
                "rule" => rule_text.to_string(),
                key => self
                    .get(key)
                    .map(str::to_string)
                    .unwrap_or_else(|| caps[0].to_string()),
            })
            .into_owned()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        NONE.to_string()
    } else {
        joined
    }
}

/// One line per field with its flags and description.
fn field_lines(contract: &Contract) -> String {
    if contract.fields.is_empty() {
        return format!("({})", NONE);
    }

    contract
        .fields
        .iter()
        .map(|f| {
            let mut flags = Vec::new();
            if f.required {
                flags.push("required");
            }
            if !f.nullable {
                flags.push("not null");
            }
            if f.pii {
                flags.push("PII");
            }

            let mut line = format!("- {} ({})", f.name, f.field_type);
            if !flags.is_empty() {
                line.push_str(&format!(" [{}]", flags.join(", ")));
            }
            if let Some(description) = f.description.as_deref().filter(|d| !d.trim().is_empty()) {
                line.push_str(&format!(": {}", description));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compact `name: type` listing with bounds.
fn field_summary(contract: &Contract) -> String {
    if contract.fields.is_empty() {
        return NONE.to_string();
    }

    contract
        .fields
        .iter()
        .map(|f| {
            let mut entry = format!("{}: {}", f.name, f.field_type);
            match (f.min_value, f.max_value) {
                (Some(min), Some(max)) => entry.push_str(&format!(" [{}..{}]", min, max)),
                (Some(min), None) => entry.push_str(&format!(" [>= {}]", min)),
                (None, Some(max)) => entry.push_str(&format!(" [<= {}]", max)),
                (None, None) => {}
            }
            if let Some(len) = f.max_length {
                entry.push_str(&format!(" (max length {})", len));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn quality_summary(contract: &Contract) -> String {
    let quality = &contract.quality;
    let mut rules = Vec::new();

    if let Some(t) = quality.completeness_threshold {
        rules.push(format!("completeness >= {}%", t));
    }
    if let Some(t) = quality.accuracy_threshold {
        rules.push(format!("accuracy >= {}%", t));
    }
    if let Some(sla) = &quality.freshness_sla {
        rules.push(format!("freshness within {}", sla));
    }
    if !quality.uniqueness_fields.is_empty() {
        rules.push(format!("unique on {}", quality.uniqueness_fields.join(", ")));
    }

    if rules.is_empty() {
        NONE.to_string()
    } else {
        rules.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = r#"
dataset:
  name: "customers"
  owner: "crm-team"
fields:
  - name: "customer_id"
    type: "string"
    required: true
    nullable: false
    description: "Customer key"
  - name: "email"
    type: "string"
    pii: true
  - name: "age"
    type: "int"
    min_value: 0
    max_value: 150
governance:
  classification: "confidential"
  compliance_tags: ["GDPR"]
quality:
  completeness_threshold: 98
  uniqueness_fields: ["customer_id"]
"#;

    fn context() -> PromptContext {
        PromptContext::from_contract(&Contract::from_yaml(CONTRACT).unwrap())
    }

    #[test]
    fn test_placeholders_substituted() {
        let prompt = context().render(
            "Dataset {dataset_name} ({classification}), {field_count} fields, PII: {pii_fields}. Rule: {rule}",
            "No plaintext emails",
        );
        assert_eq!(
            prompt,
            "Dataset customers (confidential), 3 fields, PII: email. Rule: No plaintext emails"
        );
    }

    #[test]
    fn test_json_braces_and_unknown_placeholders_untouched() {
        let prompt = context().render(r#"{unknown} {"findings": []}"#, "");
        assert_eq!(prompt, r#"{unknown} {"findings": []}"#);
    }

    #[test]
    fn test_substituted_text_is_not_expanded_again() {
        let prompt = context().render(
            "Rule: {rule} | Owner: {owner}",
            "Never copy {fields} or {owner} into logs",
        );
        assert_eq!(
            prompt,
            "Rule: Never copy {fields} or {owner} into logs | Owner: crm-team"
        );

        let mut contract = Contract::from_yaml(CONTRACT).unwrap();
        contract.dataset.description = Some("Mirrors {pii_fields} nightly".to_string());
        let prompt = PromptContext::from_contract(&contract).render("{description}", "");
        assert_eq!(prompt, "Mirrors {pii_fields} nightly");
    }

    #[test]
    fn test_field_lines_and_summaries() {
        let ctx = context();
        let fields = ctx.get("fields").unwrap();
        assert!(fields.contains("- customer_id (string) [required, not null]: Customer key"));
        assert!(fields.contains("- email (string) [PII]"));

        assert!(ctx.get("field_summary").unwrap().contains("age: int [0..150]"));
        assert_eq!(
            ctx.get("quality_rules").unwrap(),
            "completeness >= 98%; unique on customer_id"
        );
    }

    #[test]
    fn test_missing_values_have_fallbacks() {
        let ctx = context();
        assert_eq!(ctx.get("retention_days"), Some("unspecified"));
        assert_eq!(ctx.get("approved_use_cases"), Some("none"));
        assert_eq!(ctx.get("data_residency"), Some("unspecified"));
        assert_eq!(ctx.get("encryption_required"), Some("false"));
    }
}
