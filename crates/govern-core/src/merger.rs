//! Result Merger: combines engine reports into one validation result.
//!
//! Merging applies fixed rules:
//! 1. A single engine's report becomes the result as-is
//! 2. With both engines, semantic violations that restate a rule violation
//!    on the same field are dropped
//! 3. The combined list is ordered by contract-adjusted severity
//!
//! Status and counters always derive from the final violation list.

use std::cmp::Reverse;

use crate::analyzer::ContractAnalysis;
use crate::types::{EngineReport, ValidationResult, Violation};

const PII_KEYWORDS: [&str; 2] = ["pii", "sensitive"];
const ENCRYPTION_KEYWORD: &str = "encryption";
const COMPLIANCE_KEYWORD: &str = "compliance";

/// Merges rule-based and semantic reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMerger;

impl ResultMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        rules: Option<EngineReport>,
        semantic: Option<EngineReport>,
        analysis: &ContractAnalysis,
    ) -> ValidationResult {
        match (rules, semantic) {
            (None, None) => ValidationResult::passing(),
            (Some(report), None) | (None, Some(report)) => report.into(),
            (Some(rules), Some(semantic)) => self.merge_both(rules, semantic, analysis),
        }
    }

    fn merge_both(
        &self,
        rules: EngineReport,
        semantic: EngineReport,
        analysis: &ContractAnalysis,
    ) -> ValidationResult {
        let passed = rules.passed + semantic.passed;
        let mut violations = rules.violations;
        let rule_count = violations.len();

        let mut dropped = 0usize;
        for candidate in semantic.violations {
            if violations[..rule_count]
                .iter()
                .any(|existing| is_duplicate(existing, &candidate))
            {
                dropped += 1;
                continue;
            }
            violations.push(candidate);
        }

        if dropped > 0 {
            tracing::debug!(dropped, "Dropped semantic violations duplicating rule violations");
        }

        violations.sort_by_cached_key(|v| {
            (
                adjusted_rank(v, analysis),
                Reverse(v.message.len()),
                v.policy.clone(),
            )
        });

        ValidationResult::from_violations(violations, passed)
    }
}

fn mentions_any(label: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| label.contains(k))
}

/// Same field, and both labels are about sensitive data or both about
/// encryption.
fn is_duplicate(rule: &Violation, semantic: &Violation) -> bool {
    let same_field = match (&rule.field, &semantic.field) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    if !same_field {
        return false;
    }

    let a = rule.policy.to_lowercase();
    let b = semantic.policy.to_lowercase();

    (mentions_any(&a, &PII_KEYWORDS) && mentions_any(&b, &PII_KEYWORDS))
        || (a.contains(ENCRYPTION_KEYWORD) && b.contains(ENCRYPTION_KEYWORD))
}

/// Severity rank, promoted by one when the violation concerns something the
/// contract is known to carry (PII or compliance obligations).
fn adjusted_rank(violation: &Violation, analysis: &ContractAnalysis) -> i32 {
    let label = violation.policy.to_lowercase();
    let pii_related = analysis.has_pii && mentions_any(&label, &PII_KEYWORDS);
    let compliance_related = analysis.compliance_required && label.contains(COMPLIANCE_KEYWORD);

    let rank = violation.severity.rank();
    if pii_related || compliance_related {
        rank - 1
    } else {
        rank
    }
}
