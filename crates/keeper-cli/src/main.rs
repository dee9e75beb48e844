mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keeper_core::Variant;

#[derive(Parser)]
#[command(
    name = "keeper",
    about = "Keep Yandex Cloud Compute instances running behind a secret-URL dashboard"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard, API and auto-start loop
    Serve {
        /// Interface to bind (overrides keeper.toml)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides keeper.toml)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a Dockerfile for this project
    Dockerfile {
        /// Recipe variant: script, asgi or native
        #[arg(long)]
        variant: Option<Variant>,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Write ./Dockerfile for manual customization
    Eject {
        /// Recipe variant: script, asgi or native
        #[arg(long)]
        variant: Option<Variant>,
        /// Overwrite an existing Dockerfile
        #[arg(long)]
        force: bool,
    },
    /// List instances in the configured folder
    Instances {
        /// Instances requested per API page
        #[arg(long, default_value_t = 50)]
        page_size: u32,
        /// Print dashboard summaries as JSON
        #[arg(long)]
        summary: bool,
    },
    /// Start every stopped instance once
    AutoStart,
    /// Check key file, URL secret, static files and IAM access
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => commands::serve(host, port).await?,
        Commands::Dockerfile { variant, output } => commands::dockerfile(variant, output)?,
        Commands::Eject { variant, force } => commands::eject(variant, force)?,
        Commands::Instances { page_size, summary } => {
            commands::instances(page_size, summary).await?
        }
        Commands::AutoStart => commands::auto_start().await?,
        Commands::Doctor => commands::doctor().await?,
    }

    Ok(())
}
