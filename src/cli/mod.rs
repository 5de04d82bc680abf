//! Command-line interface for capflow
//!
//! Global flags follow the usual conventions: `-v` raises log verbosity,
//! `-q` silences everything but errors, `--config` replaces the user and
//! repository config files, `-C` changes directory first.

use crate::config::{AppConfig, CapflowConfig};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
mod output;

pub use output::Output;

use commands::{classify, config, exec, load, version};

#[derive(Parser)]
#[command(
    name = "capflow",
    version = env!("CARGO_PKG_VERSION"),
    about = "Load GPU captures in the background and gather cancellable trace statistics",
    long_about = None
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the capture type and companion files of each path
    Classify(classify::ClassifyArgs),
    /// Load captures through the background coordinator
    Load(load::LoadArgs),
    /// Run a shell command that Ctrl-C or a timeout can cancel
    Exec(exec::ExecArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show version information
    Version(version::VersionArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Failed to change directory to {dir}"))?;
        }

        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);
        let custom_config = self.config.as_deref();

        match self.command {
            Some(Commands::Classify(args)) => classify::execute(args, custom_config, &output).await,
            Some(Commands::Load(args)) => load::execute(args, custom_config, &output).await,
            Some(Commands::Exec(args)) => exec::execute(args, custom_config, &output).await,
            Some(Commands::Config(args)) => config::execute(args, custom_config, &output).await,
            Some(Commands::Version(args)) => version::execute(args).await,
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

/// Load, validate and apply the merged configuration
pub(crate) fn load_settings(custom_config: Option<&str>, output: &Output) -> Result<AppConfig> {
    let settings = CapflowConfig::load_with_custom_config(custom_config)?.settings()?;
    settings.validate().context("Invalid configuration")?;
    output.set_color(settings.output.color);
    Ok(settings)
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs go to stderr so command output stays pipeable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
