// ABOUTME: Command implementations for the collab-automator CLI
// ABOUTME: Handles execution of the run, validate and handlers commands

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::args::Args;
use super::config::Config;
use crate::engine::{Automator, Context, RunReport, TaskStatus};
use crate::parser::{DescriptorParser, DescriptorValidator, ValidationReport};
use crate::services::{RestServices, Services};

/// Automator wired to the REST collaborators described by `config`
pub fn build_automator(config: &Config) -> Result<Automator> {
    let rest = RestServices::new(config.rest_config()?)
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
    Ok(Automator::with_services(Services::from_rest(Arc::new(rest))))
}

/// Run a descriptor file
pub async fn run_descriptor(
    descriptor_path: PathBuf,
    context_entries: Vec<String>,
    dry_run: bool,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Loading descriptor: {}", descriptor_path.display());

    let seed = Args::parse_context(&context_entries)?;
    let descriptor = DescriptorParser::new()
        .parse_file(&descriptor_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse descriptor: {}", e))?;

    let automator = build_automator(config)?;
    let report = DescriptorValidator::new(automator.registry().clone()).validate(&descriptor);
    check_report(&report)?;

    if dry_run {
        info!("Dry run - descriptor validation successful");
        return Ok(());
    }

    let context = Context::from_values(automator.clone(), seed);
    let mut task = automator.task_with_context(descriptor, context);
    let outcome = task.run().await;
    let run_report = task.report();

    if let Some(output_path) = output {
        let json_content = serde_json::to_string_pretty(&run_report)
            .map_err(|e| anyhow::anyhow!("Failed to serialize run report: {}", e))?;
        std::fs::write(&output_path, json_content).map_err(|e| {
            anyhow::anyhow!("Failed to write output file '{}': {}", output_path.display(), e)
        })?;
        info!("Run report written to: {}", output_path.display());
    } else {
        print_report(&run_report);
    }

    match outcome {
        Ok(_) => Ok(()),
        Err(task_error) => Err(anyhow::anyhow!("Run failed: {}", task_error)),
    }
}

/// Validate a descriptor file
pub async fn validate_descriptor(descriptor_path: PathBuf, config: &Config) -> Result<()> {
    info!("Validating descriptor: {}", descriptor_path.display());

    let descriptor = DescriptorParser::new()
        .parse_file(&descriptor_path)
        .await
        .map_err(|e| anyhow::anyhow!("Descriptor validation failed: {}", e))?;

    let automator = build_automator(config)?;
    let report = DescriptorValidator::new(automator.registry().clone()).validate(&descriptor);
    check_report(&report)?;

    println!("✓ Descriptor '{}' is valid", descriptor_path.display());
    println!("  Tasks: {}", report.recognized.len());
    for path in &report.recognized {
        println!("    {}", path);
    }

    Ok(())
}

/// Print the registered task types
pub fn list_handlers(config: &Config) -> Result<()> {
    let automator = build_automator(config)?;
    for task_type in automator.registry().task_types() {
        println!("{}", task_type);
    }
    Ok(())
}

fn check_report(report: &ValidationReport) -> Result<()> {
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    if report.is_valid {
        return Ok(());
    }

    let messages: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
    Err(anyhow::anyhow!(
        "Descriptor validation failed:\n{}",
        messages.join("\n")
    ))
}

fn print_report(report: &RunReport) {
    println!("Run finished with status: {}", report.status);

    for record in &report.tasks {
        println!("  Task '{}': {}", record.task_type, record.status);
        if let Some(ref error) = record.error {
            println!("    Error: {}", error);
        }
    }

    if report.status == TaskStatus::Success {
        println!(
            "  {} of {} tasks succeeded",
            report.summary.successful_tasks, report.summary.total_tasks
        );
    }
}
