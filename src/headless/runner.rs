//! Headless mode runner
//!
//! Starts a session, streams its events to stdout, runs the optional
//! workflow on every selected device and stops on completion or Ctrl-C.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use phonecloud_app::config::load_settings;
use phonecloud_app::{FleetRunner, LocalWorkflow, ScriptedWorkflow, Session};
use phonecloud_core::prelude::*;
use phonecloud_core::SessionEvent;

use super::{HeadlessEvent, RunEvent};

/// What to run, resolved from the command line
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub project_path: PathBuf,
    pub access_token: String,
    pub endpoint: Option<String>,
    pub devices: Vec<String>,
    pub workflow: Option<PathBuf>,
}

/// Run in headless mode until the workflow finishes or Ctrl-C
pub async fn run_headless(options: HeadlessOptions) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("PhoneCloud starting in HEADLESS mode");
    info!("Project: {}", options.project_path.display());
    info!("═══════════════════════════════════════════════════════");

    let mut settings = load_settings(&options.project_path);
    if let Some(endpoint) = &options.endpoint {
        settings.connection.endpoint = endpoint.clone();
    }
    settings.select_devices(&options.devices);

    // Load the workflow before connecting so a bad file fails fast
    let workflow = options
        .workflow
        .as_deref()
        .map(ScriptedWorkflow::load)
        .transpose()?;

    let (events_tx, events_rx) = broadcast::channel(settings.connection.event_capacity.max(1));
    let printer = tokio::spawn(print_events(events_rx));

    let session = Session::from_settings(&settings, &options.access_token, events_tx).await?;

    match workflow {
        Some(workflow) => {
            let device_ids = session.registry().selected();
            HeadlessEvent::run(RunEvent::RunStarted {
                workflow: LocalWorkflow::name(&workflow).to_string(),
                devices: device_ids.clone(),
            })
            .emit();

            let runner = FleetRunner::new(workflow, settings.retry.policy());
            tokio::select! {
                reports = runner.run(&session, &device_ids) => {
                    for report in &reports {
                        HeadlessEvent::run(RunEvent::device_finished(report)).emit();
                    }
                    HeadlessEvent::run(RunEvent::run_finished(&reports)).emit();
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                }
            }
        }
        None => {
            info!("No workflow given; streaming events until Ctrl-C");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }

    session.stop().await;
    drop(session);

    // The printer ends once every event sender is gone
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;

    info!("PhoneCloud headless mode exiting");
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => HeadlessEvent::session(event).emit(),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Headless output lagged, {} events dropped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
