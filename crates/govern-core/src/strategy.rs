//! Validation strategy selection.
//!
//! Decides which engines run for a contract and, for semantic assessment,
//! which policies. Selection is a pure function of the analysis, the
//! semantic catalog and whether the semantic engine is available.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analyzer::{ContractAnalysis, RiskLevel};
use crate::policy::SemanticCatalog;

/// Estimated cost of a full rule-based pass, in seconds.
pub const RULES_COST_SECONDS: f64 = 0.1;

/// Estimated cost of one semantic policy call, in seconds.
pub const SEMANTIC_POLICY_COST_SECONDS: f64 = 3.0;

/// ADAPTIVE chooses FAST below this complexity for low-risk contracts.
const ADAPTIVE_FAST_COMPLEXITY: u8 = 30;

/// BALANCED adds the business-logic policy at or above this complexity.
const BUSINESS_LOGIC_COMPLEXITY: u8 = 50;

pub const SENSITIVE_DATA_POLICY: &str = "sensitive-data";
pub const COMPLIANCE_POLICY: &str = "compliance";
pub const BUSINESS_LOGIC_POLICY: &str = "business-logic-consistency";
pub const SECURITY_PATTERN_POLICY: &str = "security-pattern";

/// Validation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strategy {
    /// Rules only
    Fast,
    /// Rules plus the semantic policies relevant to the contract
    Balanced,
    /// Rules plus the whole semantic catalog
    Thorough,
    /// Pick one of the above from the contract's risk profile
    #[default]
    Adaptive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Fast => write!(f, "FAST"),
            Strategy::Balanced => write!(f, "BALANCED"),
            Strategy::Thorough => write!(f, "THOROUGH"),
            Strategy::Adaptive => write!(f, "ADAPTIVE"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(Strategy::Fast),
            "balanced" => Ok(Strategy::Balanced),
            "thorough" => Ok(Strategy::Thorough),
            "adaptive" => Ok(Strategy::Adaptive),
            other => Err(format!(
                "unknown strategy '{}' (expected fast, balanced, thorough or adaptive)",
                other
            )),
        }
    }
}

/// The plan for validating one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationDecision {
    /// Strategy as requested by the caller
    pub requested: Strategy,

    /// Strategy actually executed; never ADAPTIVE
    pub strategy: Strategy,

    pub run_rules: bool,
    pub run_semantic: bool,

    /// Semantic policy ids to run; `None` means the whole catalog
    pub semantic_policies: Option<Vec<String>>,

    pub reasoning: String,
    pub estimated_seconds: f64,

    /// Semantic assessment would have run but the engine is unavailable
    pub semantic_degraded: bool,
}

impl OrchestrationDecision {
    /// Ids of the semantic policies this decision runs, in catalog order.
    pub fn selected_policies(&self, catalog: &SemanticCatalog) -> Vec<String> {
        if !self.run_semantic {
            return Vec::new();
        }
        match &self.semantic_policies {
            Some(ids) => ids.clone(),
            None => catalog.ids().map(str::to_string).collect(),
        }
    }
}

/// Chooses an [`OrchestrationDecision`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector;

impl StrategySelector {
    pub fn new() -> Self {
        Self
    }

    /// The concrete strategy ADAPTIVE resolves to, with its reasoning.
    pub fn resolve_adaptive(&self, analysis: &ContractAnalysis) -> (Strategy, String) {
        match analysis.risk_level {
            RiskLevel::Critical | RiskLevel::High => (
                Strategy::Thorough,
                format!(
                    "{} risk contract warrants full semantic review",
                    analysis.risk_level
                ),
            ),
            RiskLevel::Low if analysis.complexity_score < ADAPTIVE_FAST_COMPLEXITY => (
                Strategy::Fast,
                format!(
                    "LOW risk and complexity {} below {}; rules are sufficient",
                    analysis.complexity_score, ADAPTIVE_FAST_COMPLEXITY
                ),
            ),
            level => (
                Strategy::Balanced,
                format!(
                    "{} risk with complexity {}; targeted semantic review",
                    level, analysis.complexity_score
                ),
            ),
        }
    }

    /// Semantic policy ids relevant to the contract, restricted to those the
    /// catalog actually has.
    pub fn balanced_subset(
        &self,
        analysis: &ContractAnalysis,
        catalog: &SemanticCatalog,
    ) -> Vec<String> {
        let candidates = [
            (
                SENSITIVE_DATA_POLICY,
                analysis.has_pii || analysis.has_sensitive_data,
            ),
            (COMPLIANCE_POLICY, analysis.compliance_required),
            (
                BUSINESS_LOGIC_POLICY,
                analysis.complexity_score >= BUSINESS_LOGIC_COMPLEXITY,
            ),
            (SECURITY_PATTERN_POLICY, analysis.has_sensitive_data),
        ];

        candidates
            .into_iter()
            .filter(|(id, wanted)| *wanted && catalog.contains(id))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Plan a validation run.
    pub fn decide(
        &self,
        requested: Strategy,
        analysis: &ContractAnalysis,
        catalog: &SemanticCatalog,
        semantic_available: bool,
    ) -> OrchestrationDecision {
        let (resolved, mut reasoning) = match requested {
            Strategy::Adaptive => {
                let (strategy, why) = self.resolve_adaptive(analysis);
                (strategy, format!("ADAPTIVE selected {}: {}", strategy, why))
            }
            other => (other, format!("{} requested", other)),
        };

        if !semantic_available {
            let degraded = resolved != Strategy::Fast;
            if degraded {
                reasoning = format!(
                    "{}; semantic engine unavailable, falling back to FAST",
                    reasoning
                );
                tracing::warn!(
                    requested = %requested,
                    resolved = %resolved,
                    "Semantic engine unavailable, forcing FAST"
                );
            }
            return OrchestrationDecision {
                requested,
                strategy: Strategy::Fast,
                run_rules: true,
                run_semantic: false,
                semantic_policies: None,
                reasoning,
                estimated_seconds: RULES_COST_SECONDS,
                semantic_degraded: degraded,
            };
        }

        let (run_semantic, semantic_policies, semantic_count) = match resolved {
            Strategy::Balanced => {
                let subset = self.balanced_subset(analysis, catalog);
                if subset.is_empty() {
                    reasoning.push_str("; no relevant semantic policies, rules only");
                    (false, None, 0)
                } else {
                    let count = subset.len();
                    (true, Some(subset), count)
                }
            }
            Strategy::Thorough => (!catalog.is_empty(), None, catalog.len()),
            Strategy::Fast | Strategy::Adaptive => (false, None, 0),
        };

        OrchestrationDecision {
            requested,
            strategy: resolved,
            run_rules: true,
            run_semantic,
            semantic_policies,
            reasoning,
            estimated_seconds: estimate_seconds(semantic_count),
            semantic_degraded: false,
        }
    }
}

/// Estimated wall-clock cost of a run.
pub fn estimate_seconds(semantic_policy_count: usize) -> f64 {
    RULES_COST_SECONDS + SEMANTIC_POLICY_COST_SECONDS * semantic_policy_count as f64
}
