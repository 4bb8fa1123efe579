use anyhow::Result;

use super::{load_rules, load_semantic};
use crate::output;

pub fn execute(rules_path: Option<&str>, semantic_path: Option<&str>) -> Result<()> {
    let rules = load_rules(rules_path)?;
    output::print_success(&format!(
        "Rule catalog OK: {} policies ({})",
        rules.len(),
        rules_path.unwrap_or("built-in")
    ));

    let semantic = load_semantic(semantic_path)?;
    output::print_success(&format!(
        "Semantic catalog OK: {} policies ({})",
        semantic.len(),
        semantic_path.unwrap_or("built-in")
    ));
    for policy in semantic.policies() {
        output::print_info(&format!(
            "{} [{}] {} ({})",
            policy.info.id, policy.info.severity, policy.info.name, policy.policy_type
        ));
    }

    Ok(())
}
