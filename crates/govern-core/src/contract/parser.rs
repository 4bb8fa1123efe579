//! Contract parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_contract_schema;

/// Errors that can occur when parsing contracts.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Failed to read contract file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Contract does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Data classification tier, ordered from least to most sensitive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

impl Classification {
    /// Confidential and restricted data are treated as sensitive.
    pub fn is_sensitive(self) -> bool {
        self >= Classification::Confidential
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Public => write!(f, "public"),
            Classification::Internal => write!(f, "internal"),
            Classification::Confidential => write!(f, "confidential"),
            Classification::Restricted => write!(f, "restricted"),
        }
    }
}

/// Dataset identity and ownership.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetInfo {
    pub name: String,

    /// Owning team or individual
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A single field descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    /// Declared data type (e.g., "string", "int64", "timestamp")
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Marked as personally identifiable information
    #[serde(default)]
    pub pii: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub max_length: Option<u32>,

    #[serde(default)]
    pub min_value: Option<f64>,

    #[serde(default)]
    pub max_value: Option<f64>,
}

impl FieldSpec {
    /// Create a nullable, optional, non-PII field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: false,
            nullable: true,
            pii: false,
            description: None,
            max_length: None,
            min_value: None,
            max_value: None,
        }
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

/// Governance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Governance {
    #[serde(default)]
    pub classification: Classification,

    #[serde(default)]
    pub encryption_required: bool,

    #[serde(default)]
    pub retention_days: Option<u32>,

    /// Compliance frameworks this dataset falls under (e.g., "GDPR", "HIPAA")
    #[serde(default)]
    pub compliance_tags: Vec<String>,

    #[serde(default)]
    pub approved_use_cases: Vec<String>,

    #[serde(default)]
    pub data_residency: Option<String>,
}

/// Data quality expectations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityRules {
    /// Minimum percentage of non-null values (0-100)
    #[serde(default)]
    pub completeness_threshold: Option<f64>,

    /// Minimum percentage of accurate values (0-100)
    #[serde(default)]
    pub accuracy_threshold: Option<f64>,

    /// Maximum data age, as a human duration (e.g., "24h", "15m")
    #[serde(default)]
    pub freshness_sla: Option<String>,

    #[serde(default)]
    pub uniqueness_fields: Vec<String>,
}

impl QualityRules {
    /// Number of quality rules declared.
    ///
    /// Completeness, accuracy and freshness count once each when present;
    /// the uniqueness constraint counts once when it names any field.
    pub fn rule_count(&self) -> usize {
        [
            self.completeness_threshold.is_some(),
            self.accuracy_threshold.is_some(),
            self.freshness_sla.is_some(),
            !self.uniqueness_fields.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// A data contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub dataset: DatasetInfo,

    /// Ordered field descriptors
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default)]
    pub governance: Governance,

    #[serde(default)]
    pub quality: QualityRules,
}

impl Contract {
    /// Create an empty contract for a dataset.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            dataset: DatasetInfo {
                name: name.into(),
                owner: owner.into(),
                ..Default::default()
            },
            fields: Vec::new(),
            governance: Governance::default(),
            quality: QualityRules::default(),
        }
    }

    /// Parse a contract from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ContractError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a contract from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a contract from a file, choosing the format by extension.
    ///
    /// `.json` files are parsed as JSON; everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Schema-check, deserialize, then structurally validate.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ContractError> {
        validate_contract_schema(&value).map_err(ContractError::SchemaViolation)?;
        let contract: Contract = serde_json::from_value(value)?;
        contract.validate()?;
        Ok(contract)
    }

    fn validate(&self) -> Result<(), ContractError> {
        if self.dataset.name.trim().is_empty() {
            return Err(ContractError::MissingField("dataset.name".to_string()));
        }
        Ok(())
    }

    /// Fields marked as PII, in declaration order.
    pub fn pii_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.pii)
    }

    pub fn has_pii(&self) -> bool {
        self.fields.iter().any(|f| f.pii)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check for a compliance tag, ignoring case and punctuation
    /// ("PCI-DSS" matches "pci_dss").
    pub fn has_compliance_tag(&self, tag: &str) -> bool {
        let wanted = normalize_tag(tag);
        self.governance
            .compliance_tags
            .iter()
            .any(|t| normalize_tag(t) == wanted)
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONTRACT: &str = r#"
dataset:
  name: "customer_profiles"
  owner: "crm-team"
fields:
  - name: "customer_id"
    type: "string"
    required: true
    nullable: false
  - name: "email"
    type: "string"
    pii: true
governance:
  classification: "confidential"
  compliance_tags: ["GDPR", "PCI-DSS"]
quality:
  completeness_threshold: 99
  uniqueness_fields: ["customer_id"]
"#;

    #[test]
    fn test_parse_valid_contract() {
        let contract = Contract::from_yaml(VALID_CONTRACT).unwrap();
        assert_eq!(contract.dataset.name, "customer_profiles");
        assert_eq!(contract.fields.len(), 2);
        assert_eq!(contract.governance.classification, Classification::Confidential);
        assert_eq!(contract.pii_fields().count(), 1);
        assert_eq!(contract.quality.rule_count(), 2);
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let contract = Contract::from_yaml("dataset:\n  name: \"events\"\n").unwrap();
        assert!(contract.fields.is_empty());
        assert_eq!(contract.governance.classification, Classification::Internal);
        assert!(!contract.governance.encryption_required);
        assert!(contract.dataset.owner.is_empty());
        assert_eq!(contract.quality.rule_count(), 0);
    }

    #[test]
    fn test_field_nullable_defaults_to_true() {
        let contract = Contract::from_yaml(
            r#"
dataset:
  name: "events"
fields:
  - name: "id"
    type: "string"
"#,
        )
        .unwrap();
        assert!(contract.fields[0].nullable);
        assert!(!contract.fields[0].required);
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = Contract::from_yaml("dataset:\n  name: \"   \"\n");
        assert!(matches!(result, Err(ContractError::MissingField(_))));
    }

    #[test]
    fn test_schema_violation_reported() {
        let result = Contract::from_yaml(
            r#"
dataset:
  name: "events"
governance:
  classification: "secret"
"#,
        );
        assert!(matches!(result, Err(ContractError::SchemaViolation(_))));
    }

    #[test]
    fn test_json_contract() {
        let contract =
            Contract::from_json(r#"{"dataset": {"name": "orders", "owner": "sales"}}"#).unwrap();
        assert_eq!(contract.dataset.owner, "sales");
    }

    #[test]
    fn test_compliance_tag_matching_is_loose() {
        let contract = Contract::from_yaml(VALID_CONTRACT).unwrap();
        assert!(contract.has_compliance_tag("gdpr"));
        assert!(contract.has_compliance_tag("pci_dss"));
        assert!(!contract.has_compliance_tag("HIPAA"));
    }

    #[test]
    fn test_classification_ordering() {
        assert!(Classification::Restricted.is_sensitive());
        assert!(Classification::Confidential.is_sensitive());
        assert!(!Classification::Internal.is_sensitive());
        assert!(Classification::Public < Classification::Internal);
    }
}
