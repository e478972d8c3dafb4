//! Overlay Controller
//!
//! Replay driver: runs the controller against the headless collaborators and
//! feeds it JSON lines from stdin.
//!
//! # Input
//!
//! One `DriverCommand` per line, tagged by `command`:
//!
//! ```text
//! {"command":"conference","live":true,"conference_id":"c1","roster":[{"id":"alice"}]}
//! {"command":"event","event":{"type":"conference_joined","conference_id":"c1"}}
//! {"command":"sleep","ms":1500}
//! {"command":"expand"}
//! {"command":"event","event":{"type":"conference_left"}}
//! ```
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Build headless collaborators and spawn the controller actor
//! 4. Replay stdin until EOF or shutdown signal
//! 5. Log the final state, cancel the actor and render metrics

#![warn(clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use common::events::DomainEvent;
use overlay_controller::actors::{OverlayControllerActor, OverlayControllerHandle};
use overlay_controller::collaborators::{Collaborators, EventBus, TracingErrorSink};
use overlay_controller::config::{Config, ControllerConfig};
use overlay_controller::errors::OverlayError;
use overlay_controller::headless::{
    ConferenceUpdate, HeadlessHost, InMemoryConference, LoggingAudioCues, LoggingOverlayFactory,
};
use overlay_controller::observability::init_metrics_recorder;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Root surface id reported by the headless host.
const HEADLESS_ROOT_SURFACE: &str = "headless-root";

/// One line of driver input.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum DriverCommand {
    /// Publish a domain event on the bus.
    Event { event: DomainEvent },
    HostResumed,
    HostPaused,
    Enable { enabled: bool },
    Resize,
    Expand,
    Minimize,
    Close,
    /// Update the in-memory backend state.
    Conference(ConferenceUpdate),
    Sleep { ms: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overlay_controller=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Overlay Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        controller_id = %config.controller_id,
        enabled = config.enabled,
        retained_on_leave = config.retained_on_leave,
        default_presentation = config.default_presentation.as_str(),
        settle_delay_ms = config.settle_delay_ms,
        allowlist_len = config.conference_allowlist.len(),
        mailbox_capacity = config.mailbox_capacity,
        "Configuration loaded successfully"
    );

    // This must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        format!("Failed to install Prometheus metrics recorder: {e}")
    })?;

    let bus = EventBus::default();
    let conference = Arc::new(InMemoryConference::new());
    let collaborators = Collaborators {
        events: Arc::new(bus.clone()),
        conference: conference.clone(),
        host: Arc::new(HeadlessHost::new(HEADLESS_ROOT_SURFACE)),
        overlays: Arc::new(LoggingOverlayFactory),
        audio: Arc::new(LoggingAudioCues),
        errors: Arc::new(TracingErrorSink),
    };

    let cancel_token = CancellationToken::new();
    let (handle, task) = OverlayControllerActor::spawn(
        ControllerConfig::from(&config),
        collaborators,
        cancel_token.child_token(),
    );
    info!(controller_id = %handle.controller_id(), "Controller started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<DriverCommand>(&line) {
                            Ok(command) => {
                                if let Err(e) = run_command(command, &handle, &bus, &conference).await {
                                    warn!(error = %e, "Command failed");
                                }
                            }
                            Err(e) => warn!(error = %e, "Ignoring malformed input line"),
                        }
                    }
                    Ok(None) => {
                        info!("End of input");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        break;
                    }
                }
            }
        }
    }

    match handle.get_state().await {
        Ok(state) => info!(
            lifecycle = state.lifecycle.as_str(),
            phase = state.phase.as_str(),
            roster = ?state.roster_ids(),
            attaches = state.attach_count,
            aborted_attaches = state.aborted_attach_count,
            detaches = state.detach_count,
            "Final controller state"
        ),
        Err(e) => warn!(error = %e, "Could not read final controller state"),
    }

    cancel_token.cancel();
    if let Err(e) = task.await {
        warn!(error = %e, "Controller task ended abnormally");
    }

    debug!(metrics = %prometheus_handle.render(), "Final metrics");
    info!("Overlay Controller shutdown complete");
    Ok(())
}

async fn run_command(
    command: DriverCommand,
    handle: &OverlayControllerHandle,
    bus: &EventBus,
    conference: &InMemoryConference,
) -> Result<(), OverlayError> {
    match command {
        DriverCommand::Event { event } => {
            let receivers = bus.publish(event);
            debug!(receivers, "Event published");
            // Let the controller drain the bus before the next host signal
            handle.get_state().await.map(|_| ())
        }
        DriverCommand::HostResumed => handle.host_resumed().await,
        DriverCommand::HostPaused => handle.host_paused().await,
        DriverCommand::Enable { enabled } => handle.set_enabled(enabled).await,
        DriverCommand::Resize => handle.surface_resized().await,
        DriverCommand::Expand => handle.dispatch(DomainEvent::ExpandRequested).await,
        DriverCommand::Minimize => handle.dispatch(DomainEvent::MinimizeRequested).await,
        DriverCommand::Close => handle.close_overlay().await,
        DriverCommand::Conference(update) => {
            conference.apply(update);
            Ok(())
        }
        DriverCommand::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
