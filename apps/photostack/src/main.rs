//! PhotoStack CLI.
//!
//! Builds the photo gallery stack from environment configuration and either
//! prints it (`synth`, `plan`), deploys it to an in-process local cloud and
//! serves it (`up`), or works on the presentation layer alone (`build-site`,
//! `preview`).
//!
//! # Usage
//!
//! ```text
//! PHOTOS_DIR=./photos SITE_DIR=./site photostack up --build-site
//! photostack build-site --api-url http://127.0.0.1:4566/api/abc123/ --out site
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STACK_NAME` | `photostack` | Prefix of physical resource names |
//! | `GATEWAY_LISTEN` | `127.0.0.1:4566` | Bind address of the local gateway |
//! | `PUBLIC_ENDPOINT` | *(derived)* | Base URL written into generated URLs |
//! | `PHOTOS_DIR` | `photos` | Directory uploaded into the photo bucket |
//! | `SITE_DIR` | `frontend/build` | Directory uploaded into the website bucket |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photostack_core::StackConfig;
use photostack_stack::LogicalId;
use tracing_subscriber::EnvFilter;

/// Provision and serve a serverless photo gallery.
#[derive(Debug, Parser)]
#[command(name = "photostack", version, about, long_about = None)]
struct Cli {
    /// Directory synchronized into the photo bucket.
    #[arg(long, global = true, env = "PHOTOS_DIR")]
    photos_dir: Option<PathBuf>,

    /// Directory synchronized into the website bucket.
    #[arg(long, global = true, env = "SITE_DIR")]
    site_dir: Option<PathBuf>,

    /// Gateway bind address.
    #[arg(long, global = true, env = "GATEWAY_LISTEN")]
    listen: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stack as a CloudFormation template.
    Synth,
    /// Print the apply order.
    Plan,
    /// Deploy to the local cloud and serve it until Ctrl-C.
    Up {
        /// Rebuild the site bundle against the provisioned API first.
        #[arg(long)]
        build_site: bool,
    },
    /// Write the static site bundle.
    BuildSite {
        /// API base URL; defaults to `PHOTOSTACK_API_URL` captured at build time.
        #[arg(long)]
        api_url: Option<String>,
        /// Output directory.
        #[arg(long, default_value = "frontend/build")]
        out: PathBuf,
        /// Slide interval in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Fetch the photo list once and print the carousel markup.
    Preview {
        /// API base URL; defaults to `PHOTOSTACK_API_URL` captured at build time.
        #[arg(long)]
        api_url: Option<String>,
        /// Slide interval in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn stack_config(&self) -> Result<StackConfig> {
        let mut config = StackConfig::from_env().context("failed to load configuration")?;
        if let Some(dir) = &self.photos_dir {
            config.photos_dir.clone_from(dir);
        }
        if let Some(dir) = &self.site_dir {
            config.site_dir.clone_from(dir);
        }
        if let Some(listen) = &self.listen {
            config.gateway_listen.clone_from(listen);
        }
        Ok(config)
    }
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.stack_config()?;
    init_tracing(&config.log_level)?;

    match cli.command {
        Command::Synth => {
            let template = commands::synth(&config)?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        Command::Plan => {
            for step in commands::plan(&config)? {
                let deps: Vec<&str> = step.depends_on.iter().map(LogicalId::as_str).collect();
                println!(
                    "{:>3}. {:<40} {:<22} <- [{}]",
                    step.step,
                    step.logical_id.as_str(),
                    step.kind.to_string(),
                    deps.join(", ")
                );
            }
        }
        Command::Up { build_site } => commands::up(config, build_site).await?,
        Command::BuildSite {
            api_url,
            out,
            interval_ms,
        } => {
            let bundle =
                commands::build_site(api_url.as_deref(), &out, Duration::from_millis(interval_ms))?;
            println!("wrote {} files to {}", bundle.files.len(), bundle.out_dir.display());
        }
        Command::Preview {
            api_url,
            interval_ms,
        } => {
            let html =
                commands::preview(api_url.as_deref(), Duration::from_millis(interval_ms)).await?;
            println!("{html}");
        }
    }
    Ok(())
}
