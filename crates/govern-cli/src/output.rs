use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use govern_core::{ContractAnalysis, Severity, Strategy, ValidationResult, ValidationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_validation_result(
    dataset: &str,
    result: &ValidationResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Text => {
            print_validation_text(dataset, result);
            Ok(())
        }
    }
}

fn print_validation_text(dataset: &str, result: &ValidationResult) {
    println!("\n{}", "═".repeat(60));
    println!("  {} {}", "GOVERNANCE REPORT".bold(), dataset);
    println!("{}", "═".repeat(60));

    let status = match result.status() {
        ValidationStatus::Passed => format!("✓ {}", result.status()).green().bold(),
        ValidationStatus::Warning => format!("! {}", result.status()).yellow().bold(),
        ValidationStatus::Failed => format!("✗ {}", result.status()).red().bold(),
    };
    println!("\n{}", status);

    if let Some(metadata) = result.metadata() {
        println!(
            "\n{} {} (risk {}, complexity {})",
            "Strategy:".bold(),
            metadata.strategy,
            metadata.risk_level,
            metadata.complexity_score
        );
        println!("  {}", metadata.reasoning.dimmed());
        if !metadata.semantic_policies.is_empty() {
            println!("  Semantic policies: {}", metadata.semantic_policies.join(", "));
        }
    }

    if !result.violations().is_empty() {
        println!("\n{}", "Violations:".bold());
        for (i, v) in result.violations().iter().enumerate() {
            let severity = match v.severity {
                Severity::Critical => v.severity.to_string().red().bold(),
                Severity::Warning => v.severity.to_string().yellow().bold(),
                Severity::Info => v.severity.to_string().blue(),
            };
            let location = v
                .field
                .as_deref()
                .map(|f| format!(" [{}]", f))
                .unwrap_or_default();
            println!("  {}. {} {}{}: {}", i + 1, severity, v.policy, location, v.message);
            if !v.remediation.is_empty() {
                println!("     {} {}", "→".dimmed(), v.remediation.dimmed());
            }
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Passed:   {}", result.passed());
    println!("  Warnings: {}", result.warnings());
    println!("  Failures: {}", result.failures());
    println!("{}", "═".repeat(60));
}

pub fn print_analysis(dataset: &str, analysis: &ContractAnalysis, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(analysis);
    }

    println!("{} {}", "Analysis:".bold(), dataset);
    println!("  Risk level:      {}", analysis.risk_level);
    println!("  Complexity:      {}/100", analysis.complexity_score);
    println!("  Classification:  {}", analysis.classification);
    println!(
        "  Fields:          {} ({} PII)",
        analysis.field_count, analysis.pii_field_count
    );
    if analysis.compliance_required {
        println!("  Compliance:      {}", analysis.compliance_frameworks.join(", "));
    }
    if !analysis.concerns.is_empty() {
        println!("\n{}", "Concerns:".yellow().bold());
        for concern in &analysis.concerns {
            println!("  - {}", concern);
        }
    }
    Ok(())
}

pub fn print_recommendation(dataset: &str, strategy: Strategy, reasoning: &str) {
    println!("{} {} → {}", "Recommendation:".bold(), dataset, strategy.to_string().green().bold());
    println!("  {}", reasoning);
}

pub fn print_models(models: &[String], configured: &str) {
    if models.is_empty() {
        print_info("Backend reports no models");
        return;
    }
    for model in models {
        if model == configured || model.split(':').next() == Some(configured) {
            println!("{} {}", "*".green().bold(), model.green());
        } else {
            println!("  {}", model);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
