use crate::cancel::CancellationContext;
use crate::cli::{Output, load_settings};
use crate::external::CommandRunner;
use anyhow::{Context, Result, bail};
use clap::Args;
use std::time::Duration;
use tracing::info;

#[derive(Args)]
pub struct ExecArgs {
    /// Cancel the command after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Command line, run through `sh -c`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

pub async fn execute(args: ExecArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let settings = load_settings(custom_config, output)?;
    let runner = CommandRunner::new(settings.process.poll_interval());
    let context = CancellationContext::new();
    let command = args.command.join(" ");

    let mut task = tokio::task::spawn_blocking({
        let context = context.clone();
        let command = command.clone();
        move || runner.run(&context, &command)
    });

    let deadline = async {
        match args.timeout_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };

    let result = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, cancelling `{}`", command);
            context.cancel();
            task.await
        }
        _ = deadline => {
            info!("Timeout reached, cancelling `{}`", command);
            context.cancel();
            task.await
        }
    }
    .context("Command runner task failed")?;

    match result {
        Ok(text) => {
            if !text.is_empty() {
                println!("{text}");
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            output.warning(&format!("Cancelled `{command}`"));
            bail!("Command cancelled")
        }
        Err(e) => Err(e.into()),
    }
}
