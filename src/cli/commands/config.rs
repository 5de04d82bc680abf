use crate::cli::Output;
use crate::config::CapflowConfig;
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Print one configuration value or section
    Get { key: String },
    /// Validate the merged configuration
    Validate,
}

pub async fn execute(args: ConfigArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = CapflowConfig::load_with_custom_config(custom_config)?;

    match args.command {
        ConfigCommand::Show { format } => {
            let settings = config.settings()?;
            let rendered = match format.to_lowercase().as_str() {
                "toml" => toml::to_string_pretty(&settings)
                    .context("Failed to render configuration as TOML")?,
                "json" => serde_json::to_string_pretty(&settings)
                    .context("Failed to render configuration as JSON")?,
                _ => bail!("Unsupported format: {format}. Use toml or json"),
            };
            println!("{rendered}");
        }
        ConfigCommand::Get { key } => {
            let value = config
                .get_section(&key)
                .with_context(|| format!("Configuration key '{key}' not found"))?;
            match value {
                serde_json::Value::String(s) => println!("{s}"),
                serde_json::Value::Array(items) => {
                    for item in items {
                        match item {
                            serde_json::Value::String(s) => println!("{s}"),
                            other => println!("{other}"),
                        }
                    }
                }
                serde_json::Value::Object(_) => {
                    println!("{}", serde_json::to_string_pretty(&value)?)
                }
                other => println!("{other}"),
            }
        }
        ConfigCommand::Validate => {
            let settings = config.settings()?;
            settings.validate()?;

            output.success("Configuration is valid");
            output.key_value(
                "poll interval",
                &format!("{} ms", settings.process.poll_interval_ms),
                false,
            );
            output.key_value(
                "capture types",
                &format!(
                    ".{} + {}",
                    settings.capture.auxiliary_extension,
                    settings
                        .capture
                        .primary_extensions
                        .iter()
                        .map(|ext| format!(".{ext}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                false,
            );
            output.key_value(
                "stats poll stride",
                &settings.stats.cancel_poll_stride.to_string(),
                false,
            );
        }
    }

    Ok(())
}
