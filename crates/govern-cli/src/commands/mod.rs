pub mod analyze;
pub mod catalog;
pub mod models;
pub mod recommend;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use govern_core::{Contract, RuleCatalog, SemanticCatalog};
use govern_runtime::{BackendRegistry, RuntimeConfig, ValidationOrchestrator};
use std::sync::Arc;

/// Options shared by commands that build the orchestrator.
#[derive(Args, Debug, Clone, Default)]
pub struct RuntimeArgs {
    /// Runtime configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Rule-based catalog (defaults to the built-in catalog)
    #[arg(long)]
    pub rules: Option<String>,

    /// Semantic catalog (defaults to the built-in catalog)
    #[arg(long)]
    pub semantic: Option<String>,
}

pub fn load_contract(path: &str) -> Result<Contract> {
    Contract::from_file(path).with_context(|| format!("Failed to load contract: {}", path))
}

pub fn load_config(path: Option<&str>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path)),
        None => Ok(RuntimeConfig::default()),
    }
}

pub fn load_rules(path: Option<&str>) -> Result<RuleCatalog> {
    match path {
        Some(path) => RuleCatalog::from_file(path)
            .with_context(|| format!("Failed to load rule catalog: {}", path)),
        None => RuleCatalog::builtin().context("Built-in rule catalog is invalid"),
    }
}

pub fn load_semantic(path: Option<&str>) -> Result<SemanticCatalog> {
    match path {
        Some(path) => SemanticCatalog::from_file(path)
            .with_context(|| format!("Failed to load semantic catalog: {}", path)),
        None => SemanticCatalog::builtin().context("Built-in semantic catalog is invalid"),
    }
}

pub fn build_orchestrator(args: &RuntimeArgs) -> Result<ValidationOrchestrator> {
    let config = load_config(args.config.as_deref())?;
    let rules = load_rules(args.rules.as_deref())?;
    let semantic = load_semantic(args.semantic.as_deref())?;

    let orchestrator = ValidationOrchestrator::from_config(
        &config,
        &BackendRegistry::with_defaults(),
        Arc::new(rules),
        Arc::new(semantic),
    )?;
    Ok(orchestrator)
}
