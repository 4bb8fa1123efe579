use anyhow::Result;

use super::load_contract;
use crate::output::{self, OutputFormat};

pub fn execute(contract_path: &str, format: OutputFormat) -> Result<()> {
    let contract = load_contract(contract_path)?;
    let analysis = govern_core::analyze(&contract);
    output::print_analysis(&contract.dataset.name, &analysis, format)
}
