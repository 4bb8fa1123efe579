use anyhow::Result;

use super::{build_orchestrator, load_contract, RuntimeArgs};
use crate::output;

pub async fn execute(contract_path: &str, runtime: &RuntimeArgs) -> Result<()> {
    let contract = load_contract(contract_path)?;
    let orchestrator = build_orchestrator(runtime)?;

    let (strategy, reasoning) = orchestrator.recommend_strategy(&contract).await;
    output::print_recommendation(&contract.dataset.name, strategy, &reasoning);
    Ok(())
}
