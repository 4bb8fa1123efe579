//! Policy catalog loading.
//!
//! Catalogs are YAML or JSON documents with a `policies` list. They are
//! loaded once at startup and shared read-only; any problem with a catalog
//! is a configuration error surfaced at load time.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::{Policy, PolicyInfo, RuleBasedPolicy, RuleCheck, SemanticPolicy, SemanticPolicyType};
use crate::types::Severity;

const BUILTIN_RULES_YAML: &str = include_str!("../../policies/rules.yaml");
const BUILTIN_SEMANTIC_YAML: &str = include_str!("../../policies/semantic.yaml");

/// Configuration errors raised while loading a catalog.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy catalog: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML catalog: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid policy '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },

    #[error("Duplicate policy ID: {0}")]
    DuplicateId(String),

    #[error("Policy '{id}' is not a {expected} policy")]
    WrongKind { id: String, expected: &'static str },

    #[error("Rule catalog contains no policies")]
    EmptyCatalog,
}

/// Catalog document as written on disk.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    #[allow(dead_code)] // Informational, not interpreted
    version: Option<String>,

    policies: Vec<PolicyEntry>,
}

/// One catalog entry before it is resolved into a typed [`Policy`].
#[derive(Debug, Deserialize)]
struct PolicyEntry {
    id: String,
    name: String,
    severity: Severity,
    #[serde(default)]
    description: String,
    #[serde(default)]
    remediation: String,
    #[serde(default)]
    rule: Option<String>,
    #[serde(default)]
    rule_text: Option<String>,
    #[serde(default)]
    prompt_template: Option<String>,
    #[serde(default)]
    policy_type: Option<String>,
}

impl PolicyEntry {
    fn invalid(&self, reason: impl Into<String>) -> PolicyError {
        PolicyError::InvalidEntry {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    /// Resolve the entry: `rule` makes it rule-based, `prompt_template`
    /// makes it semantic, and exactly one must be present.
    fn resolve(self) -> Result<Policy, PolicyError> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id must not be empty"));
        }

        match (&self.rule, &self.prompt_template) {
            (Some(_), Some(_)) => Err(self.invalid("has both 'rule' and 'prompt_template'")),
            (None, None) => Err(self.invalid("needs either 'rule' or 'prompt_template'")),
            (Some(rule), None) => {
                let rule: RuleCheck = rule.parse().map_err(|e: String| self.invalid(e))?;
                Ok(Policy::RuleBased(RuleBasedPolicy {
                    info: self.into_info(),
                    rule,
                }))
            }
            (None, Some(template)) => {
                if template.trim().is_empty() {
                    return Err(self.invalid("prompt_template must not be empty"));
                }
                let policy_type = match &self.policy_type {
                    Some(t) => t.parse().map_err(|e: String| self.invalid(e))?,
                    None => SemanticPolicyType::default(),
                };
                let prompt_template = template.clone();
                let rule_text = self
                    .rule_text
                    .clone()
                    .unwrap_or_else(|| self.description.clone());
                Ok(Policy::Semantic(SemanticPolicy {
                    info: self.into_info(),
                    rule_text,
                    prompt_template,
                    policy_type,
                }))
            }
        }
    }

    fn into_info(self) -> PolicyInfo {
        PolicyInfo {
            id: self.id,
            name: self.name,
            severity: self.severity,
            description: self.description,
            remediation: self.remediation,
        }
    }
}

fn resolve_document(doc: CatalogDocument) -> Result<Vec<Policy>, PolicyError> {
    let mut seen = HashSet::new();
    let mut policies = Vec::with_capacity(doc.policies.len());

    for entry in doc.policies {
        if !seen.insert(entry.id.clone()) {
            return Err(PolicyError::DuplicateId(entry.id));
        }
        policies.push(entry.resolve()?);
    }

    Ok(policies)
}

fn parse_file(path: &Path) -> Result<Vec<Policy>, PolicyError> {
    let contents = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => resolve_document(serde_json::from_str(&contents)?),
        _ => resolve_document(serde_yaml::from_str(&contents)?),
    }
}

/// The rule-based policy catalog.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    policies: Vec<RuleBasedPolicy>,
}

impl RuleCatalog {
    fn from_policies(policies: Vec<Policy>) -> Result<Self, PolicyError> {
        let policies = policies
            .into_iter()
            .map(|p| match p {
                Policy::RuleBased(rule) => Ok(rule),
                Policy::Semantic(s) => Err(PolicyError::WrongKind {
                    id: s.info.id,
                    expected: "rule-based",
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if policies.is_empty() {
            return Err(PolicyError::EmptyCatalog);
        }

        tracing::debug!(count = policies.len(), "Rule catalog loaded");
        Ok(Self { policies })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        Self::from_policies(resolve_document(serde_yaml::from_str(yaml)?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Self::from_policies(resolve_document(serde_json::from_str(json)?)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        Self::from_policies(parse_file(path.as_ref())?)
    }

    /// The catalog shipped with this crate.
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_yaml(BUILTIN_RULES_YAML)
    }

    pub fn policies(&self) -> &[RuleBasedPolicy] {
        &self.policies
    }

    pub fn get(&self, id: &str) -> Option<&RuleBasedPolicy> {
        self.policies.iter().find(|p| p.info.id == id)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// The semantic policy catalog. May be empty, in which case semantic
/// assessment is unavailable.
#[derive(Debug, Clone, Default)]
pub struct SemanticCatalog {
    policies: Vec<SemanticPolicy>,
}

impl SemanticCatalog {
    fn from_policies(policies: Vec<Policy>) -> Result<Self, PolicyError> {
        let policies = policies
            .into_iter()
            .map(|p| match p {
                Policy::Semantic(s) => Ok(s),
                Policy::RuleBased(r) => Err(PolicyError::WrongKind {
                    id: r.info.id,
                    expected: "semantic",
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = policies.len(), "Semantic catalog loaded");
        Ok(Self { policies })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        Self::from_policies(resolve_document(serde_yaml::from_str(yaml)?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Self::from_policies(resolve_document(serde_json::from_str(json)?)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        Self::from_policies(parse_file(path.as_ref())?)
    }

    /// The catalog shipped with this crate.
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_yaml(BUILTIN_SEMANTIC_YAML)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn policies(&self) -> &[SemanticPolicy] {
        &self.policies
    }

    pub fn get(&self, id: &str) -> Option<&SemanticPolicy> {
        self.policies.iter().find(|p| p.info.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|p| p.info.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rule_catalog_loads() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), RuleCheck::ALL.len());

        // Every known check is covered exactly once
        for check in RuleCheck::ALL {
            assert_eq!(
                catalog.policies().iter().filter(|p| p.rule == check).count(),
                1,
                "check {:?} missing from builtin catalog",
                check
            );
        }
    }

    #[test]
    fn test_builtin_semantic_catalog_loads() {
        let catalog = SemanticCatalog::builtin().unwrap();
        for id in [
            "sensitive-data",
            "compliance",
            "business-logic-consistency",
            "security-pattern",
        ] {
            assert!(catalog.contains(id), "missing semantic policy {}", id);
        }
        assert!(catalog
            .policies()
            .iter()
            .all(|p| !p.prompt_template.trim().is_empty()));
    }

    #[test]
    fn test_unknown_rule_is_configuration_error() {
        let yaml = r#"
policies:
  - id: "R1"
    name: "Mystery"
    severity: critical
    rule: "does_not_exist"
"#;
        let result = RuleCatalog::from_yaml(yaml);
        assert!(matches!(result, Err(PolicyError::InvalidEntry { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
policies:
  - id: "R1"
    name: "Owner"
    severity: critical
    rule: "owner_required"
  - id: "R1"
    name: "Owner again"
    severity: warning
    rule: "owner_required"
"#;
        assert!(matches!(
            RuleCatalog::from_yaml(yaml),
            Err(PolicyError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_semantic_entry_in_rule_catalog_rejected() {
        let yaml = r#"
policies:
  - id: "S1"
    name: "Semantic"
    severity: warning
    prompt_template: "Review {dataset_name}"
"#;
        assert!(matches!(
            RuleCatalog::from_yaml(yaml),
            Err(PolicyError::WrongKind { .. })
        ));
        assert_eq!(SemanticCatalog::from_yaml(yaml).unwrap().len(), 1);
    }

    #[test]
    fn test_entry_with_both_kinds_rejected() {
        let yaml = r#"
policies:
  - id: "X1"
    name: "Confused"
    severity: info
    rule: "owner_required"
    prompt_template: "Review"
"#;
        assert!(matches!(
            SemanticCatalog::from_yaml(yaml),
            Err(PolicyError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_empty_rule_catalog_rejected() {
        assert!(matches!(
            RuleCatalog::from_yaml("policies: []"),
            Err(PolicyError::EmptyCatalog)
        ));
        assert!(SemanticCatalog::from_yaml("policies: []").unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_catalog() {
        assert!(matches!(
            RuleCatalog::from_yaml("policies: [unclosed"),
            Err(PolicyError::YamlError(_))
        ));
        assert!(matches!(
            RuleCatalog::from_json("{"),
            Err(PolicyError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = RuleCatalog::from_file("/nonexistent/rules.yaml");
        assert!(matches!(result, Err(PolicyError::IoError(_))));
    }

    #[test]
    fn test_semantic_defaults() {
        let yaml = r#"
policies:
  - id: "naming"
    name: "Naming conventions"
    severity: info
    description: "Field names follow snake_case"
    prompt_template: "Check {fields}"
"#;
        let catalog = SemanticCatalog::from_yaml(yaml).unwrap();
        let policy = catalog.get("naming").unwrap();
        assert_eq!(policy.policy_type, SemanticPolicyType::Generic);
        assert_eq!(policy.rule_text, "Field names follow snake_case");
    }
}
