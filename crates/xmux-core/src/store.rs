// ABOUTME: Owner of the current settings snapshot.
// ABOUTME: Persists updates and broadcasts full snapshots to subscribers over a watch channel.

use std::path::PathBuf;

use tokio::sync::watch;

use crate::{Settings, SettingsError};

/// Holds the live settings and notifies subscribers whenever any value changes
pub struct SettingsStore {
    path: Option<PathBuf>,
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    /// In-memory store backed by `path` when given
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(settings.sanitized());
        Self { path, tx }
    }

    /// Load from the default settings file, falling back to defaults
    pub fn load_default() -> Self {
        Self::new(Settings::load_or_default(), Settings::default_path())
    }

    pub fn get(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent snapshot
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Apply `f` to a copy of the settings, persist it, then broadcast it.
    /// Nothing is broadcast when the edit leaves the settings unchanged.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let mut next = self.get();
        f(&mut next);
        let next = next.sanitized();
        if next == *self.tx.borrow() {
            return Ok(());
        }
        if let Some(path) = &self.path {
            next.save(path)?;
        }
        self.tx.send_replace(next);
        tracing::debug!("Settings updated");
        Ok(())
    }
}
