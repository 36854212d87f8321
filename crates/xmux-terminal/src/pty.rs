// ABOUTME: Owner of the OS-level pseudo-terminals, one shell process per panel.
// ABOUTME: Spawns shells with portable-pty and pushes their output onto the event channel.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::watch;
use xmux_core::{GridSize, PanelId, Settings};

use crate::bridge::{BridgeError, PtyBridge, PtyEvent, PtyEventSender};

/// Environment every spawned shell sees on top of the inherited one
fn shell_env() -> Vec<(&'static str, String)> {
    vec![
        ("TERM", "xterm-256color".to_string()),
        ("COLORTERM", "truecolor".to_string()),
        ("TERM_PROGRAM", "xmux".to_string()),
        (
            "LANG",
            std::env::var("LANG").unwrap_or_else(|_| "en_US.UTF-8".to_string()),
        ),
    ]
}

fn pty_size(size: GridSize) -> PtySize {
    PtySize {
        rows: size.rows.max(GridSize::MIN_ROWS),
        cols: size.cols.max(GridSize::MIN_COLS),
        pixel_width: 0,
        pixel_height: 0,
    }
}

struct PtySession {
    /// Distinguishes a replacement session from the one a reader thread belongs to
    generation: u64,
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

type Sessions = Arc<Mutex<HashMap<PanelId, PtySession>>>;

/// Spawns and tracks one shell per panel. Output is read on a thread per
/// session and delivered as [`PtyEvent`]s.
pub struct PtyProcessManager {
    sessions: Sessions,
    events: PtyEventSender,
    settings: watch::Receiver<Settings>,
    next_generation: Mutex<u64>,
}

impl PtyProcessManager {
    /// Shell path and starting directory are read from `settings` at spawn time
    pub fn new(events: PtyEventSender, settings: watch::Receiver<Settings>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events,
            settings,
            next_generation: Mutex::new(0),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn has_session(&self, panel_id: PanelId) -> bool {
        self.sessions.lock().contains_key(&panel_id)
    }

    /// Terminate every process
    pub fn destroy_all(&self) {
        let drained: Vec<_> = self.sessions.lock().drain().collect();
        if !drained.is_empty() {
            tracing::info!("Terminating {} shell(s)", drained.len());
        }
        for (panel_id, session) in drained {
            kill(panel_id, session);
        }
    }

    /// Start the shell. The returned reader must only be handed to
    /// [`spawn_reader`](Self::spawn_reader) once the session is in the map.
    fn spawn(
        &self,
        panel_id: PanelId,
        size: GridSize,
    ) -> Result<(PtySession, Box<dyn Read + Send>), BridgeError> {
        let spawn_err = |e: anyhow::Error| BridgeError::Spawn {
            panel_id,
            reason: e.to_string(),
        };

        let general = self.settings.borrow().general.clone();
        let shell = general.shell();
        let cwd = general.working_directory();

        let pair = native_pty_system()
            .openpty(pty_size(size))
            .map_err(spawn_err)?;

        let mut cmd = CommandBuilder::new(&shell);
        cmd.cwd(&cwd);
        for (key, value) in shell_env() {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(spawn_err)?;
        // Keep only the master side open so reads hit EOF when the shell exits
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(spawn_err)?;
        let writer = pair.master.take_writer().map_err(spawn_err)?;

        let generation = {
            let mut next = self.next_generation.lock();
            *next += 1;
            *next
        };

        tracing::info!(
            "Spawned {} in {} for panel {} ({}x{})",
            shell,
            cwd.display(),
            panel_id,
            size.cols,
            size.rows
        );

        let session = PtySession {
            generation,
            master: pair.master,
            writer,
            child,
        };
        Ok((session, reader))
    }

    fn spawn_reader(&self, panel_id: PanelId, generation: u64, mut reader: Box<dyn Read + Send>) {
        let events = self.events.clone();
        let sessions = Arc::clone(&self.sessions);

        thread::spawn(move || {
            let mut buffer = [0u8; 8192];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if events.send(PtyEvent::data(panel_id, &buffer[..n])).is_err() {
                            return;
                        }
                    }
                    // EIO once the child side is gone
                    Err(_) => break,
                }
            }

            // A destroyed or replaced session has already been accounted for
            let finished = {
                let mut sessions = sessions.lock();
                match sessions.get(&panel_id) {
                    Some(s) if s.generation == generation => sessions.remove(&panel_id),
                    _ => None,
                }
            };
            if let Some(mut session) = finished {
                let code = exit_code(session.child.as_mut());
                tracing::info!("Shell for panel {} exited with {:?}", panel_id, code);
                let _ = events.send(PtyEvent::exit(panel_id, code));
            }
        });
    }
}

fn exit_code(child: &mut (dyn Child + Send + Sync)) -> Option<i32> {
    let status = match child.try_wait() {
        Ok(Some(status)) => status,
        _ => child.wait().ok()?,
    };
    i32::try_from(status.exit_code()).ok()
}

/// Kill the shell and reap it off-thread so no zombie is left behind
fn kill(panel_id: PanelId, session: PtySession) {
    let PtySession {
        master,
        writer,
        mut child,
        ..
    } = session;
    drop(writer);
    drop(master);
    if let Err(e) = child.kill() {
        tracing::debug!("Shell for panel {} already gone: {}", panel_id, e);
    }
    thread::spawn(move || match child.wait() {
        Ok(status) => tracing::debug!("Reaped shell for panel {}: {:?}", panel_id, status),
        Err(e) => tracing::debug!("Failed to reap shell for panel {}: {}", panel_id, e),
    });
}

impl PtyBridge for PtyProcessManager {
    fn create(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError> {
        let (session, reader) = self.spawn(panel_id, size)?;
        let generation = session.generation;
        // The reader looks its session up on EOF, so it starts only after the insert
        let replaced = self.sessions.lock().insert(panel_id, session);
        self.spawn_reader(panel_id, generation, reader);
        if let Some(old) = replaced {
            tracing::warn!("Replaced running shell for panel {}", panel_id);
            kill(panel_id, old);
        }
        Ok(())
    }

    fn write(&self, panel_id: PanelId, bytes: &[u8]) -> Result<(), BridgeError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&panel_id)
            .ok_or(BridgeError::UnknownSession(panel_id))?;
        session.writer.write_all(bytes)?;
        session.writer.flush()?;
        Ok(())
    }

    fn resize(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(&panel_id)
            .ok_or(BridgeError::UnknownSession(panel_id))?;
        session
            .master
            .resize(pty_size(size))
            .map_err(|e| BridgeError::Resize {
                panel_id,
                reason: e.to_string(),
            })
    }

    fn destroy(&self, panel_id: PanelId) -> Result<(), BridgeError> {
        let removed = self.sessions.lock().remove(&panel_id);
        if let Some(session) = removed {
            tracing::info!("Terminating shell for panel {}", panel_id);
            kill(panel_id, session);
        }
        Ok(())
    }
}

impl Drop for PtyProcessManager {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
