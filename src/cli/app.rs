// ABOUTME: Main application orchestration for the collab-automator CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use anyhow::{anyhow, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::config::LogFormat;
use super::{Args, Commands, Config};

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging. `--verbose` wins over `RUST_LOG`, which wins over the
    /// configured level. Logs go to stderr so stdout carries only command output.
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let env_filter = if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.config.logging.level))
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(!no_color)
            .with_target(false);

        match self.config.logging.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Pretty => builder.try_init(),
        }
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

        debug!("Logging initialized ({:?})", self.config.logging.format);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting collab-automator v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::Run {
                descriptor,
                context,
                dry_run,
                output,
            } => commands::run_descriptor(descriptor, context, dry_run, output, &self.config).await,

            Commands::Validate { descriptor } => {
                commands::validate_descriptor(descriptor, &self.config).await
            }

            Commands::Handlers => commands::list_handlers(&self.config),
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}
