use anyhow::Result;
use govern_core::Strategy;
use tracing::info;

use super::{build_orchestrator, load_contract, RuntimeArgs};
use crate::output::{self, OutputFormat};

pub async fn execute(
    contract_path: &str,
    strategy: Strategy,
    runtime: &RuntimeArgs,
    format: OutputFormat,
) -> Result<()> {
    info!(contract = contract_path, strategy = %strategy, "Validating contract");

    let contract = load_contract(contract_path)?;
    let orchestrator = build_orchestrator(runtime)?;

    let result = orchestrator.validate(&contract, strategy).await;
    output::print_validation_result(&contract.dataset.name, &result, format)?;

    if result.is_failed() {
        std::process::exit(1);
    }

    Ok(())
}
