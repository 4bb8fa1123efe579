//! Interpreting model output for semantic policies.
//!
//! The model is asked for JSON, but output is still untrusted: the object is
//! located, matched against the envelope for the policy type, and
//! low-confidence findings are dropped. Anything that does not fit the
//! envelope is a [`ParseError`] and the policy is skipped.

use govern_core::{EngineKind, SemanticPolicy, SemanticPolicyType, Severity, Violation};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::providers::GenerateResponse;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap();
}

/// Errors from interpreting model output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("No JSON object found in model output")]
    NoJson,

    #[error("Unexpected {policy_type} response shape: {message}")]
    Shape {
        policy_type: SemanticPolicyType,
        message: String,
    },
}

/// One issue reported by the model, after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticFinding {
    pub field: Option<String>,
    pub message: String,
    /// Overrides the policy severity when present
    pub severity: Option<Severity>,
    /// Overrides the policy remediation when present
    pub remediation: Option<String>,
}

impl SemanticFinding {
    pub fn into_violation(self, policy: &SemanticPolicy) -> Violation {
        Violation {
            severity: self.severity.unwrap_or(policy.info.severity),
            policy: policy.info.name.clone(),
            policy_id: policy.info.id.clone(),
            field: self.field,
            message: self.message,
            remediation: self
                .remediation
                .unwrap_or_else(|| policy.info.remediation.clone()),
            engine: EngineKind::Semantic,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindingsEnvelope {
    findings: Vec<SensitiveItem>,
}

#[derive(Debug, Deserialize)]
struct SensitiveItem {
    #[serde(default)]
    field: Option<String>,
    #[serde(default, alias = "message")]
    reason: String,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    severity: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ComplianceEnvelope {
    #[serde(default)]
    compliant: Option<bool>,
    #[serde(default)]
    issues: Option<Vec<ComplianceItem>>,
}

#[derive(Debug, Deserialize)]
struct ComplianceItem {
    #[serde(default)]
    field: Option<String>,
    #[serde(default, alias = "message")]
    issue: String,
    #[serde(default)]
    framework: Option<String>,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default)]
    remediation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RisksEnvelope {
    risks: Vec<RiskItem>,
}

#[derive(Debug, Deserialize)]
struct RiskItem {
    #[serde(default)]
    field: Option<String>,
    #[serde(default, alias = "message")]
    risk: String,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default, alias = "remediation")]
    mitigation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViolationsEnvelope {
    violations: Vec<GenericItem>,
}

#[derive(Debug, Deserialize)]
struct GenericItem {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default)]
    remediation: Option<String>,
}

/// Parse a backend response into findings for one policy type.
///
/// For confidence-gated types a finding below `confidence_threshold` (0-100),
/// or with no usable confidence, is suppressed.
pub fn parse_findings(
    response: &GenerateResponse,
    policy_type: SemanticPolicyType,
    confidence_threshold: f64,
) -> Result<Vec<SemanticFinding>, ParseError> {
    let value = extract_json(response)?;

    let findings = match policy_type {
        SemanticPolicyType::SensitiveData => {
            let envelope: FindingsEnvelope = decode(value, policy_type)?;
            envelope
                .findings
                .into_iter()
                .filter(|item| {
                    meets_threshold(item.confidence.as_ref(), confidence_threshold, &item.field)
                })
                .map(|item| SemanticFinding {
                    field: clean_field(item.field),
                    message: or_default(item.reason, "Field may hold unprotected sensitive data"),
                    severity: severity(item.severity.as_ref()),
                    remediation: None,
                })
                .collect()
        }
        SemanticPolicyType::Compliance => {
            let envelope: ComplianceEnvelope = decode(value, policy_type)?;
            match envelope {
                ComplianceEnvelope {
                    compliant: None,
                    issues: None,
                } => {
                    return Err(ParseError::Shape {
                        policy_type,
                        message: "expected 'compliant' or 'issues'".to_string(),
                    })
                }
                ComplianceEnvelope {
                    compliant: Some(true),
                    ..
                } => Vec::new(),
                ComplianceEnvelope { issues, .. } => issues
                    .unwrap_or_default()
                    .into_iter()
                    .map(|item| {
                        let issue = or_default(item.issue, "Compliance requirement not met");
                        let message = match item.framework.as_deref().map(str::trim) {
                            Some(framework) if !framework.is_empty() => {
                                format!("[{}] {}", framework, issue)
                            }
                            _ => issue,
                        };
                        SemanticFinding {
                            field: clean_field(item.field),
                            message,
                            severity: severity(item.severity.as_ref()),
                            remediation: clean_text(item.remediation),
                        }
                    })
                    .collect(),
            }
        }
        SemanticPolicyType::RiskAssessment => {
            let envelope: RisksEnvelope = decode(value, policy_type)?;
            envelope
                .risks
                .into_iter()
                .filter(|item| {
                    meets_threshold(item.confidence.as_ref(), confidence_threshold, &item.field)
                })
                .map(|item| SemanticFinding {
                    field: clean_field(item.field),
                    message: or_default(item.risk, "Security risk identified"),
                    severity: severity(item.severity.as_ref()),
                    remediation: clean_text(item.mitigation),
                })
                .collect()
        }
        SemanticPolicyType::Generic => {
            let envelope: ViolationsEnvelope = decode(value, policy_type)?;
            envelope
                .violations
                .into_iter()
                .map(|item| SemanticFinding {
                    field: clean_field(item.field),
                    message: or_default(item.message, "Policy violation identified"),
                    severity: severity(item.severity.as_ref()),
                    remediation: clean_text(item.remediation),
                })
                .collect()
        }
    };

    Ok(findings)
}

/// Locate the JSON object in a response: the pre-parsed body, the raw text,
/// a fenced code block, then the outermost brace pair.
pub fn extract_json(response: &GenerateResponse) -> Result<Value, ParseError> {
    if let Some(value @ Value::Object(_)) = &response.structured {
        return Ok(value.clone());
    }
    extract_json_text(&response.text)
}

fn extract_json_text(text: &str) -> Result<Value, ParseError> {
    let text = text.trim();

    if let Some(value) = parse_object(text) {
        return Ok(value);
    }

    if let Some(value) = FENCED_JSON
        .captures(text)
        .and_then(|caps| parse_object(caps[1].trim()))
    {
        return Ok(value);
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            parse_object(&text[start..=end]).ok_or(ParseError::NoJson)
        }
        _ => Err(ParseError::NoJson),
    }
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(value: Value, policy_type: SemanticPolicyType) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|e| ParseError::Shape {
        policy_type,
        message: e.to_string(),
    })
}

/// Confidence on a 0-100 scale. Numbers and numeric strings are accepted.
/// Only a decimal strictly between 0 and 1 (`0.9`) is read as a fraction;
/// integers, including `0` and `1`, are already percentages.
pub fn normalize_confidence(value: Option<&Value>) -> Option<f64> {
    let (raw, decimal) = match value? {
        Value::Number(n) => (n.as_f64()?, n.is_f64()),
        Value::String(s) => {
            let s = s.trim();
            let percent = s.ends_with('%');
            let digits = s.trim_end_matches('%').trim();
            (digits.parse::<f64>().ok()?, !percent && digits.contains('.'))
        }
        _ => return None,
    };
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    Some(if decimal && raw > 0.0 && raw < 1.0 { raw * 100.0 } else { raw })
}

fn meets_threshold(confidence: Option<&Value>, threshold: f64, field: &Option<String>) -> bool {
    match normalize_confidence(confidence) {
        Some(c) if c >= threshold => true,
        other => {
            tracing::debug!(
                field = ?field,
                confidence = ?other,
                threshold,
                "Suppressing low-confidence finding"
            );
            false
        }
    }
}

fn severity(value: Option<&Value>) -> Option<Severity> {
    value.and_then(Value::as_str).and_then(|s| s.parse().ok())
}

fn clean_field(field: Option<String>) -> Option<String> {
    field
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty() && !matches!(f.to_lowercase().as_str(), "null" | "none" | "n/a"))
}

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn or_default(text: String, fallback: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}
