// ABOUTME: Main application entry point.
// ABOUTME: Wires settings, PTY manager, session registry and panel store, then drives them from stdin.

mod command;
mod workspace;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use xmux_core::{SettingsStore, Viewport};
use xmux_terminal::{event_channel, PtyProcessManager, SessionRegistry};

use command::Command;
use workspace::{Flow, Workspace};

/// Initial window size in pixels
const WINDOW_SIZE: Viewport = Viewport::new(1200.0, 800.0);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting xmux");

    let settings = SettingsStore::load_default();
    let (events_tx, events_rx) = event_channel();
    let processes = Arc::new(PtyProcessManager::new(events_tx, settings.subscribe()));
    let registry = SessionRegistry::new(Box::new(Arc::clone(&processes)), events_rx, settings.subscribe());
    let mut workspace = Workspace::new(registry, WINDOW_SIZE);

    let mut settings_changes = settings.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("xmux ready, type 'help' for commands");

    loop {
        let deadline = workspace
            .sessions()
            .next_resize_deadline()
            .map(tokio::time::Instant::from_std);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = Command::parse(&line)
                    .and_then(|command| workspace.execute(command, &settings, Instant::now()));
                match flow {
                    Ok(Flow::Continue(Some(reply))) => println!("{reply}"),
                    Ok(Flow::Continue(None)) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("error: {e:#}"),
                }
            }
            alive = workspace.sessions_mut().process_next() => {
                if !alive {
                    tracing::warn!("PTY event channel closed");
                    break;
                }
                workspace.sessions_mut().pump();
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                let fired = workspace.sessions_mut().flush_resizes(Instant::now());
                tracing::trace!("Flushed {} resize(s)", fired);
            }
            Ok(()) = settings_changes.changed() => {
                if workspace.sessions_mut().sync_settings() {
                    tracing::info!("Applied new appearance settings");
                }
            }
        }
    }

    tracing::info!("Shutting down");
    processes.destroy_all();
    Ok(())
}
