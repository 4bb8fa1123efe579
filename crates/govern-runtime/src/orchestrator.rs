//! Validation orchestrator.
//!
//! Ties the pipeline together for one contract:
//! 1. Analyze risk and complexity (deterministic)
//! 2. Check semantic availability; an unavailable backend forces FAST
//! 3. Resolve the strategy and the semantic policy subset
//! 4. Run the rule engine and, if selected, the semantic engine
//! 5. Merge and annotate with the decision
//!
//! `validate` never fails once the orchestrator is built: backend problems
//! degrade the run instead of aborting it.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use govern_core::{
    Contract, ContractAnalysis, ContractAnalyzer, OrchestrationDecision, PolicyError,
    ResultMerger, RuleCatalog, RuleEngine, SemanticCatalog, Strategy, StrategySelector,
    ValidationMetadata, ValidationResult,
};

use crate::adapter::InferenceAdapter;
use crate::config::{ConfigError, RuntimeConfig};
use crate::providers::{BackendError, BackendRegistry, InferenceBackend};
use crate::semantic::SemanticEngine;

/// Errors from building the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy catalog error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Runs rule-based and semantic validation under a chosen strategy.
///
/// `Send + Sync`; share one instance behind an `Arc` across concurrent
/// validations.
pub struct ValidationOrchestrator {
    rule_engine: RuleEngine,
    semantic_engine: SemanticEngine,
    analyzer: ContractAnalyzer,
    selector: StrategySelector,
    merger: ResultMerger,
}

impl ValidationOrchestrator {
    pub fn new(rule_engine: RuleEngine, semantic_engine: SemanticEngine) -> Self {
        Self {
            rule_engine,
            semantic_engine,
            analyzer: ContractAnalyzer::new(),
            selector: StrategySelector::new(),
            merger: ResultMerger::new(),
        }
    }

    /// Build around an already-constructed backend.
    pub fn with_backend(
        backend: Arc<dyn InferenceBackend>,
        config: &RuntimeConfig,
        rules: Arc<RuleCatalog>,
        semantic: Arc<SemanticCatalog>,
    ) -> Self {
        let adapter = Arc::new(InferenceAdapter::new(backend, config));
        Self::new(
            RuleEngine::new(rules),
            SemanticEngine::new(adapter, semantic, config.semantic.clone()),
        )
    }

    /// Validate `config` and create its backend through `registry`.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &BackendRegistry,
        rules: Arc<RuleCatalog>,
        semantic: Arc<SemanticCatalog>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let backend = registry.create(&config.backend)?;

        info!(
            backend = backend.name(),
            model = %config.backend.model,
            rule_policies = rules.len(),
            semantic_policies = semantic.len(),
            "Validation orchestrator ready"
        );

        Ok(Self::with_backend(backend, config, rules, semantic))
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rule_engine
    }

    pub fn semantic_engine(&self) -> &SemanticEngine {
        &self.semantic_engine
    }

    pub fn analyze(&self, contract: &Contract) -> ContractAnalysis {
        self.analyzer.analyze(contract)
    }

    /// Plan a run without executing it.
    pub async fn decide(
        &self,
        contract: &Contract,
        requested: Strategy,
    ) -> (ContractAnalysis, OrchestrationDecision) {
        let analysis = self.analyze(contract);
        let semantic_available = self.semantic_engine.is_available().await;
        let decision = self.selector.decide(
            requested,
            &analysis,
            self.semantic_engine.catalog(),
            semantic_available,
        );
        (analysis, decision)
    }

    /// Validate a contract under `strategy`.
    pub async fn validate(&self, contract: &Contract, strategy: Strategy) -> ValidationResult {
        let (analysis, decision) = self.decide(contract, strategy).await;
        let semantic_policies = decision.selected_policies(self.semantic_engine.catalog());

        info!(
            dataset = %contract.dataset.name,
            requested = %decision.requested,
            strategy = %decision.strategy,
            risk = %analysis.risk_level,
            complexity = analysis.complexity_score,
            semantic_policies = semantic_policies.len(),
            estimated_seconds = decision.estimated_seconds,
            "Validation strategy selected"
        );

        let rules = decision
            .run_rules
            .then(|| self.rule_engine.evaluate(contract));

        let semantic = if decision.run_semantic {
            Some(
                self.semantic_engine
                    .run(contract, Some(&semantic_policies))
                    .await,
            )
        } else {
            None
        };

        let result = self.merger.merge(rules, semantic, &analysis);

        info!(
            dataset = %contract.dataset.name,
            status = %result.status(),
            failures = result.failures(),
            warnings = result.warnings(),
            passed = result.passed(),
            "Validation complete"
        );

        result.with_metadata(ValidationMetadata {
            strategy: decision.strategy,
            risk_level: analysis.risk_level,
            complexity_score: analysis.complexity_score,
            reasoning: decision.reasoning,
            estimated_seconds: decision.estimated_seconds,
            semantic_policies,
            semantic_degraded: decision.semantic_degraded,
        })
    }

    /// The strategy ADAPTIVE would run, with its reasoning. Executes nothing.
    pub async fn recommend_strategy(&self, contract: &Contract) -> (Strategy, String) {
        let (_, decision) = self.decide(contract, Strategy::Adaptive).await;
        (decision.strategy, decision.reasoning)
    }
}
