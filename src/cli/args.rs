// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for collab-automator

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "collab-automator")]
#[command(about = "Run declarative descriptors that provision collabs, navigation and storage")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a task descriptor from a YAML or JSON file
    Run {
        #[arg(help = "Path to descriptor file")]
        descriptor: PathBuf,

        #[arg(
            short = 'C',
            long = "context",
            help = "Seed the run context (key=value, value parsed as JSON when possible)"
        )]
        context: Vec<String>,

        #[arg(long, help = "Dry run - validate without executing")]
        dry_run: bool,

        #[arg(short, long, help = "Write the JSON run report to this file")]
        output: Option<PathBuf>,
    },

    /// Validate a descriptor file without executing
    Validate {
        #[arg(help = "Path to descriptor file")]
        descriptor: PathBuf,
    },

    /// List the registered task types
    Handlers,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse context entries from key=value format
    pub fn parse_context(entries: &[String]) -> anyhow::Result<Map<String, Value>> {
        let mut context = Map::new();

        for entry in entries {
            if let Some((key, value)) = entry.split_once('=') {
                let value = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                context.insert(key.to_string(), value);
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid context entry '{}'. Expected 'key=value'",
                    entry
                ));
            }
        }

        Ok(context)
    }
}
