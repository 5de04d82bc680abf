use crate::capture::{CaptureFileType, FileClassifier};
use crate::cli::{Output, load_settings};
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Capture files to classify
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

pub async fn execute(args: ClassifyArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let settings = load_settings(custom_config, output)?;
    let classifier = FileClassifier::new(settings.capture);

    let mut failed = 0;
    for path in &args.paths {
        match classifier.classify(path) {
            Ok(files) if files.file_type() == CaptureFileType::Unknown => {
                output.error(&format!("{}: not a supported capture file", path.display()));
                failed += 1;
            }
            Ok(files) => {
                output.success(&format!("{}: {}", path.display(), files.file_type()));
                if let Some(asset) = files.asset_path() {
                    output.key_value("asset", &asset.display().to_string(), false);
                }
                if let Some(replay) = files.replay_path() {
                    output.key_value("replay", &replay.display().to_string(), false);
                }
            }
            Err(e) => {
                output.error(&format!("{}: {e}", path.display()));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} paths could not be classified", args.paths.len());
    }
    Ok(())
}
