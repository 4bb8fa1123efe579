//! Semantic assessment engine.
//!
//! Runs semantic policies against a contract through the inference adapter.
//! Each policy is one JSON-mode call; policies in a batch run concurrently
//! up to `max_concurrent_calls`, and results keep catalog order.
//!
//! # Outcomes per policy
//! - Nothing reported: the policy counts as passed
//! - Findings: one violation each
//! - Unparsable output: skipped and logged
//! - Backend failure after retries: one WARNING advisory violation

mod parser;
mod prompt;

pub use parser::{extract_json, normalize_confidence, parse_findings, ParseError, SemanticFinding};
pub use prompt::{PromptContext, GOVERNANCE_SYSTEM_PROMPT};

use futures::stream::{self, StreamExt};
use govern_core::{
    Contract, EngineKind, EngineReport, SemanticCatalog, SemanticPolicy, Severity, Violation,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterError, InferenceAdapter};
use crate::config::SemanticConfig;
use crate::providers::ResponseFormat;

enum PolicyOutcome {
    Passed,
    Violations(Vec<Violation>),
    Skipped,
    Failed(Violation),
}

/// LLM-backed policy evaluation.
pub struct SemanticEngine {
    adapter: Arc<InferenceAdapter>,
    catalog: Arc<SemanticCatalog>,
    config: SemanticConfig,
}

impl SemanticEngine {
    pub fn new(
        adapter: Arc<InferenceAdapter>,
        catalog: Arc<SemanticCatalog>,
        config: SemanticConfig,
    ) -> Self {
        Self {
            adapter,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<SemanticCatalog> {
        &self.catalog
    }

    pub fn adapter(&self) -> &Arc<InferenceAdapter> {
        &self.adapter
    }

    /// Enabled, has policies, and the backend is serving the configured model.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled {
            debug!("Semantic engine disabled by configuration");
            return false;
        }
        if self.catalog.is_empty() {
            debug!("Semantic catalog is empty");
            return false;
        }
        self.adapter.is_available().await
    }

    /// Evaluate `policy_ids` (or the whole catalog) after an availability
    /// check. An unavailable engine yields an empty report.
    pub async fn evaluate(&self, contract: &Contract, policy_ids: Option<&[String]>) -> EngineReport {
        if !self.is_available().await {
            warn!(
                dataset = %contract.dataset.name,
                "Semantic engine unavailable, returning empty result"
            );
            return EngineReport::empty(EngineKind::Semantic);
        }
        self.run(contract, policy_ids).await
    }

    /// Evaluate without checking availability first.
    pub async fn run(&self, contract: &Contract, policy_ids: Option<&[String]>) -> EngineReport {
        let policies: Vec<&SemanticPolicy> = self
            .catalog
            .policies()
            .iter()
            .filter(|p| match policy_ids {
                Some(ids) => ids.iter().any(|id| *id == p.info.id),
                None => true,
            })
            .collect();

        if policies.is_empty() {
            return EngineReport::empty(EngineKind::Semantic);
        }

        let context = PromptContext::from_contract(contract);
        let concurrency = self.config.max_concurrent_calls.max(1);

        info!(
            dataset = %contract.dataset.name,
            policies = policies.len(),
            concurrency,
            "Running semantic assessment"
        );

        // Collected first: a lazy `map` over borrowed policies makes `run` non-Send
        let pending: Vec<_> = policies
            .into_iter()
            .map(|policy| self.assess(policy, &context))
            .collect();
        let outcomes: Vec<PolicyOutcome> = stream::iter(pending)
            .buffered(concurrency)
            .collect()
            .await;

        let mut violations = Vec::new();
        let mut passed = 0;
        for outcome in outcomes {
            match outcome {
                PolicyOutcome::Passed => passed += 1,
                PolicyOutcome::Violations(found) => violations.extend(found),
                PolicyOutcome::Skipped => {}
                PolicyOutcome::Failed(advisory) => violations.push(advisory),
            }
        }

        EngineReport::new(EngineKind::Semantic, violations, passed)
    }

    async fn assess(&self, policy: &SemanticPolicy, context: &PromptContext) -> PolicyOutcome {
        let prompt = context.render(&policy.prompt_template, &policy.rule_text);
        debug!(policy = %policy.info.id, "Assessing semantic policy");

        let response = match self
            .adapter
            .generate(&prompt, Some(GOVERNANCE_SYSTEM_PROMPT), ResponseFormat::Json)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(policy = %policy.info.id, error = %e, "Semantic policy could not be evaluated");
                return PolicyOutcome::Failed(self.advisory(policy, &e));
            }
        };

        match parse_findings(&response, policy.policy_type, self.config.confidence_threshold) {
            Ok(findings) if findings.is_empty() => {
                debug!(policy = %policy.info.id, "Semantic policy passed");
                PolicyOutcome::Passed
            }
            Ok(findings) => {
                debug!(policy = %policy.info.id, findings = findings.len(), "Semantic policy reported findings");
                PolicyOutcome::Violations(
                    findings
                        .into_iter()
                        .map(|f| f.into_violation(policy))
                        .collect(),
                )
            }
            Err(e) => {
                warn!(policy = %policy.info.id, error = %e, "Unusable model output, skipping policy");
                PolicyOutcome::Skipped
            }
        }
    }

    fn advisory(&self, policy: &SemanticPolicy, error: &AdapterError) -> Violation {
        Violation {
            severity: Severity::Warning,
            policy: policy.info.name.clone(),
            policy_id: policy.info.id.clone(),
            field: None,
            message: format!(
                "Semantic policy '{}' could not be evaluated: {}",
                policy.info.name, error
            ),
            remediation: format!(
                "Verify the inference backend ({}) is reachable and model '{}' is loaded, then re-run validation.",
                self.adapter.backend_name(),
                self.adapter.model()
            ),
            engine: EngineKind::Semantic,
        }
    }
}
