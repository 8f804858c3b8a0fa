//! # Hatchet Listen
//!
//! Minimal worker process: registers with the dispatcher, drains assigned
//! actions, and reports `started` then `completed` (echoing the input) for
//! every start-step action. Ctrl-C unregisters the worker, which ends the
//! action stream cleanly.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use tracing::{error, info, warn};

use hatchet_dispatcher::{
    logging, ActionEvent, ActionType, AssignedAction, ClientConfig, ClientConfigOverrides,
    DispatcherClient, ListenerOptions,
};

#[derive(Parser)]
#[command(name = "hatchet-listen")]
#[command(about = "Register a worker with the Hatchet dispatcher and drain its actions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (defaults to ./hatchet.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker name announced at registration
    #[arg(long, env = "HATCHET_WORKER_NAME", default_value = "hatchet-listen")]
    worker_name: String,

    /// Services this worker belongs to (comma separated)
    #[arg(long = "service", env = "HATCHET_WORKER_SERVICES", value_delimiter = ',')]
    services: Vec<String>,

    /// Actions this worker can execute (comma separated)
    #[arg(long = "action", env = "HATCHET_WORKER_ACTIONS", value_delimiter = ',', required = true)]
    actions: Vec<String>,

    /// Override the configured tenant id
    #[arg(long)]
    tenant_id: Option<String>,

    /// Override the configured dispatcher host:port
    #[arg(long)]
    host_port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_structured_logging();

    let overrides = ClientConfigOverrides {
        tenant_id: cli.tenant_id,
        host_port: cli.host_port,
        ..Default::default()
    };
    let config = ClientConfig::load(cli.config.as_deref(), overrides)
        .context("Failed to load dispatcher client configuration")?;

    let client = DispatcherClient::connect(config).await?;
    let options = ListenerOptions::new(cli.worker_name)
        .with_services(cli.services)
        .with_actions(cli.actions);

    let mut listener = client.get_action_listener(options).await?;
    info!(
        worker_id = %listener.worker_id(),
        listener_id = %listener.listener_id(),
        "Listening for assigned actions"
    );

    let unregister = listener.unregister_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, unregistering worker");
            if let Err(e) = unregister.unregister().await {
                error!(error = %e, "Failed to unregister worker");
            }
        }
    });

    let mut actions = listener.actions();
    while let Some(action) = actions.next().await {
        let action = action?;
        match action.action_type {
            ActionType::StartStepRun => run_step(&client, &action).await,
            ActionType::CancelStepRun => {
                info!(step_run_id = %action.step_run_id, "Cancel requested for step run");
            }
        }
    }

    info!("Action stream ended");
    Ok(())
}

/// Report the step as started, then complete it with its own input
async fn run_step(client: &DispatcherClient, action: &AssignedAction) {
    if let Err(e) = client.send_action_event(ActionEvent::started(action)).await {
        warn!(action_id = %action.action_id, error = %e, "Failed to report step start");
    }

    let event = match action.payload_json() {
        Ok(input) => ActionEvent::completed(action, &input)
            .unwrap_or_else(|e| ActionEvent::failed(action, e)),
        Err(e) => ActionEvent::failed(action, e),
    };

    if let Err(e) = client.send_action_event(event).await {
        warn!(action_id = %action.action_id, error = %e, "Failed to report step outcome");
    }
}
