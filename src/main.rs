//! PhoneCloud - headless control-plane client for device fleets
//!
//! This is the binary entry point.

mod headless;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{error, info};

use phonecloud_app::config::{init_config_dir, resolve_access_token, API_KEY_ENV};
use phonecloud_core::logging;

use headless::runner::{run_headless, HeadlessOptions};

/// PhoneCloud - drive PhoneCloud devices over one multiplexed connection
#[derive(Parser, Debug)]
#[command(name = "phonecloud")]
#[command(about = "Headless control-plane client for PhoneCloud device fleets", long_about = None)]
struct Args {
    /// Project directory holding .phonecloud/config.toml
    #[arg(long, value_name = "DIR", default_value = ".")]
    project: PathBuf,

    /// Access credential
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the configured endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Device to connect and run on (repeatable)
    #[arg(long = "device", value_name = "ID")]
    devices: Vec<String>,

    /// Workflow file to run on every selected device
    #[arg(long, value_name = "FILE")]
    workflow: Option<PathBuf>,

    /// Write a default .phonecloud/config.toml and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.init {
        let path = init_config_dir(&args.project)?;
        eprintln!("Config written to {}", path.display());
        return Ok(());
    }

    // Log to file; stdout carries NDJSON events
    logging::init()?;

    let access_token = resolve_access_token(args.api_key.as_deref())?;
    let options = HeadlessOptions {
        project_path: args.project,
        access_token,
        endpoint: args.endpoint,
        devices: args.devices,
        workflow: args.workflow,
    };

    let result = run_headless(options).await;
    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }

    info!("PhoneCloud exiting");
    Ok(result?)
}
