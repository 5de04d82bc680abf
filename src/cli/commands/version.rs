use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information
    #[arg(long)]
    pub detailed: bool,
}

pub async fn execute(args: VersionArgs) -> Result<()> {
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    println!("capflow {} ({})", env!("CARGO_PKG_VERSION"), git_sha);
    if args.detailed {
        println!("Rust Edition: 2024");
        println!("Target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
        println!("Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    }
    Ok(())
}
