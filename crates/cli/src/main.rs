//! `intake` binary: submit a processing job, follow its log stream,
//! and clean up temporary server state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_client::api::ServiceApi;
use intake_client::cleanup::{CleanupCoordinator, CleanupTrigger};
use intake_client::config::ServiceConfig;
use intake_client::controller::{JobController, SubmitOutcome};
use intake_core::events::JobEvent;

mod frontend;

use frontend::{StdoutLog, TerminalStatus};

#[derive(Parser)]
#[command(name = "intake", about = "Submit a processing job and watch it run")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a job and follow its log until it finishes.
    Run {
        /// FORM data workbook to upload (omit to use the remote source).
        #[arg(long)]
        form_data: Option<PathBuf>,
        /// Local database workbook to upload.
        #[arg(long)]
        local_db: Option<PathBuf>,
        /// Keep temporary server artifacts when interrupted.
        #[arg(long)]
        keep_artifacts: bool,
    },
    /// Delete temporary server artifacts now.
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig::from_env();
    tracing::debug!(base_url = %config.base_url, "Loaded service configuration");

    let transport = Arc::new(ServiceApi::new(config)?);
    let status = Arc::new(TerminalStatus::new());

    match cli.command {
        Command::Run {
            form_data,
            local_db,
            keep_artifacts,
        } => {
            run_job(
                transport,
                status,
                form_data.as_deref(),
                local_db.as_deref(),
                keep_artifacts,
            )
            .await
        }
        Command::Cleanup => {
            let coordinator = CleanupCoordinator::new(transport, status);
            coordinator.cleanup_now(CleanupTrigger::UserRequest).await;
            Ok(())
        }
    }
}

/// Drive one full submission-to-completion cycle.
async fn run_job(
    transport: Arc<ServiceApi>,
    status: Arc<TerminalStatus>,
    form_data: Option<&std::path::Path>,
    local_db: Option<&std::path::Path>,
    keep_artifacts: bool,
) -> anyhow::Result<()> {
    let payload = frontend::build_payload(form_data, local_db)?;

    let log = Arc::new(StdoutLog);
    let controller = JobController::new(transport.clone(), status.clone(), log);
    let coordinator =
        CleanupCoordinator::new(transport, status).with_events(controller.event_sender());
    let mut events = controller.subscribe();

    match controller.submit(&payload).await {
        SubmitOutcome::Accepted => {}
        SubmitOutcome::Rejected => {
            controller.acknowledge().await;
            anyhow::bail!("submission rejected");
        }
        SubmitOutcome::Ignored => anyhow::bail!("a run is already active"),
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                // The terminal equivalent of navigating away: stop
                // watching and fire a best-effort cleanup.
                tracing::info!("Interrupted");
                controller.shutdown().await;
                if !keep_artifacts {
                    coordinator.cleanup_now(CleanupTrigger::Shutdown).await;
                }
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(JobEvent::RunCompleted { .. }) => return Ok(()),
                Ok(JobEvent::RunFailed { error, .. }) => {
                    controller.acknowledge().await;
                    anyhow::bail!("job failed: {error}");
                }
                Ok(_) => {}
                Err(e) => anyhow::bail!("event feed closed: {e}"),
            }
        }
    }
}
