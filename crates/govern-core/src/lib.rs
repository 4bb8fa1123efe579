//! # govern-core
//!
//! Deterministic data-contract governance.
//!
//! This crate holds everything about contract validation that does not
//! need a language model:
//! - Contract parsing with boundary validation
//! - Risk and complexity analysis
//! - The rule-based policy engine and its catalog
//! - Strategy selection and result merging
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same contract and catalog always produce the same violations
//! 2. **No LLM calls**: Semantic assessment lives in `govern-runtime`
//! 3. **Consistent verdicts**: Status and counters always derive from the violation list
//!
//! ## Example
//!
//! ```rust,ignore
//! use govern_core::{Contract, RuleCatalog, validate_rules};
//! use std::sync::Arc;
//!
//! let contract = Contract::from_file("customers.yaml")?;
//! let catalog = Arc::new(RuleCatalog::builtin()?);
//! let result = validate_rules(&contract, &catalog);
//!
//! println!("{}: {} failures", result.status(), result.failures());
//! ```

pub mod analyzer;
pub mod contract;
pub mod merger;
pub mod patterns;
pub mod policy;
pub mod rules;
pub mod strategy;
pub mod types;

// Re-export main types at crate root
pub use analyzer::{ContractAnalysis, ContractAnalyzer, RiskLevel};
pub use contract::{
    Classification, Contract, ContractError, DatasetInfo, FieldSpec, Governance, QualityRules,
};
pub use merger::ResultMerger;
pub use policy::{
    Policy, PolicyError, PolicyInfo, RuleBasedPolicy, RuleCatalog, RuleCheck, SemanticCatalog,
    SemanticPolicy, SemanticPolicyType,
};
pub use rules::{validate_rules, RuleEngine};
pub use strategy::{OrchestrationDecision, Strategy, StrategySelector};
pub use types::{
    EngineKind, EngineReport, Severity, ValidationMetadata, ValidationResult, ValidationStatus,
    Violation,
};

/// Analyze a contract.
pub fn analyze(contract: &Contract) -> ContractAnalysis {
    ContractAnalyzer::new().analyze(contract)
}
