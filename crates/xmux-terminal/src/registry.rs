// ABOUTME: Long-lived table of terminal sessions keyed by panel id.
// ABOUTME: Keeps emulator state and processes alive across view remounts; only destroy ends a session.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use xmux_core::{AppearanceConfig, PanelId, Settings, Viewport};
use xmux_layout::SessionTeardown;

use crate::bridge::{PtyBridge, PtyEvent, PtyEventKind, PtyEventReceiver};
use crate::emulator::Emulator;

/// Coalescing window for container size changes, about one frame
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(16);

/// Written into a session's screen when its process ends
pub const EXIT_MARKER: &[u8] = b"\r\n\x1b[1;31m[Process exited]\x1b[0m\r\n";

/// One of the data paths wired between an emulator and its process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// Process output is written into the emulator
    Output,
    /// Process exit writes the marker and stops output
    Exit,
    /// Keystrokes, pastes and emulator replies go to the process
    Input,
}

const ALL_SUBSCRIPTIONS: [Subscription; 3] = [
    Subscription::Output,
    Subscription::Exit,
    Subscription::Input,
];

/// Size watch installed while a view is mounted
#[derive(Debug, Clone, Copy)]
struct ResizeWatch {
    viewport: Viewport,
    /// When the coalesced resize fires; replaced on every change
    deadline: Option<Instant>,
}

pub struct SessionEntry {
    panel_id: PanelId,
    serial: u64,
    emulator: Emulator,
    pty_subscriptions: Vec<Subscription>,
    exited: bool,
    resize_watch: Option<ResizeWatch>,
}

impl SessionEntry {
    pub fn panel_id(&self) -> PanelId {
        self.panel_id
    }

    /// Unique per created entry; two lookups returning the same serial saw the same session
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    pub fn pty_subscriptions(&self) -> &[Subscription] {
        &self.pty_subscriptions
    }

    /// A process was requested for this entry
    pub fn is_attached(&self) -> bool {
        !self.pty_subscriptions.is_empty()
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// A mounted view is watching this entry's container size
    pub fn is_observed(&self) -> bool {
        self.resize_watch.is_some()
    }

    pub fn pending_resize(&self) -> Option<Instant> {
        self.resize_watch.and_then(|w| w.deadline)
    }

    fn subscribed(&self, route: Subscription) -> bool {
        self.pty_subscriptions.contains(&route)
    }
}

/// Owns every session for the lifetime of the application. View code calls
/// [`attach`](Self::attach)/[`observe_resize`](Self::observe_resize) on mount and
/// [`detach_view`](Self::detach_view) on unmount; only [`destroy`](Self::destroy)
/// ends a session.
pub struct SessionRegistry {
    bridge: Box<dyn PtyBridge>,
    events: PtyEventReceiver,
    settings: watch::Receiver<Settings>,
    appearance: AppearanceConfig,
    sessions: HashMap<PanelId, SessionEntry>,
    next_serial: u64,
}

impl SessionRegistry {
    pub fn new(
        bridge: Box<dyn PtyBridge>,
        events: PtyEventReceiver,
        mut settings: watch::Receiver<Settings>,
    ) -> Self {
        let appearance = settings.borrow_and_update().appearance.clone();
        Self {
            bridge,
            events,
            settings,
            appearance,
            sessions: HashMap::new(),
            next_serial: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, panel_id: PanelId) -> bool {
        self.sessions.contains_key(&panel_id)
    }

    pub fn get(&self, panel_id: PanelId) -> Option<&SessionEntry> {
        self.sessions.get(&panel_id)
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.sessions.keys().copied().collect()
    }

    /// Window title last set by the panel's program
    pub fn title(&self, panel_id: PanelId) -> Option<String> {
        self.sessions.get(&panel_id)?.emulator.title()
    }

    /// Existing entry for `panel_id`, or a new one with emulator state built
    /// from the current appearance. No process is started here.
    pub fn resolve(&mut self, panel_id: PanelId) -> &SessionEntry {
        self.resolve_mut(panel_id)
    }

    fn resolve_mut(&mut self, panel_id: PanelId) -> &mut SessionEntry {
        let appearance = &self.appearance;
        let next_serial = &mut self.next_serial;
        self.sessions.entry(panel_id).or_insert_with(|| {
            *next_serial += 1;
            tracing::debug!("Created session entry for panel {}", panel_id);
            SessionEntry {
                panel_id,
                serial: *next_serial,
                emulator: Emulator::new(appearance),
                pty_subscriptions: Vec::new(),
                exited: false,
                resize_watch: None,
            }
        })
    }

    /// View mounted. Starts the process on first attach; later attaches only
    /// reuse what is already running.
    pub fn attach(&mut self, panel_id: PanelId, viewport: Viewport) {
        let entry = self.resolve_mut(panel_id);
        if entry.is_attached() {
            return;
        }

        entry.emulator.fit(viewport);
        let size = entry.emulator.size();
        entry.pty_subscriptions.extend(ALL_SUBSCRIPTIONS);
        if let Err(e) = self.bridge.create(panel_id, size) {
            tracing::error!("{}", e);
        }
        tracing::info!(
            "Attached panel {} at {}x{}",
            panel_id,
            size.cols,
            size.rows
        );
    }

    /// Install the size watch for a freshly mounted view, replacing any
    /// previous watch. A remount into a container that no longer matches the
    /// grid schedules a resize the same way a change would.
    pub fn observe_resize(&mut self, panel_id: PanelId, viewport: Viewport, now: Instant) {
        let entry = self.resolve_mut(panel_id);
        let stale = entry
            .emulator
            .metrics()
            .fit(viewport)
            .is_some_and(|size| size != entry.emulator.size());
        entry.resize_watch = Some(ResizeWatch {
            viewport,
            deadline: stale.then(|| now + RESIZE_DEBOUNCE),
        });
    }

    /// The container of a mounted view changed size. Schedules one resize at
    /// `now + RESIZE_DEBOUNCE`, replacing any resize still pending.
    pub fn notify_resize(&mut self, panel_id: PanelId, viewport: Viewport, now: Instant) {
        let Some(watch) = self
            .sessions
            .get_mut(&panel_id)
            .and_then(|e| e.resize_watch.as_mut())
        else {
            return;
        };
        watch.viewport = viewport;
        watch.deadline = Some(now + RESIZE_DEBOUNCE);
    }

    /// Earliest pending resize deadline across all sessions
    pub fn next_resize_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(|e| e.pending_resize()).min()
    }

    /// Fire every debounced resize due at `now`. Returns how many fired.
    pub fn flush_resizes(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        for entry in self.sessions.values_mut() {
            let Some(watch) = entry.resize_watch.as_mut() else {
                continue;
            };
            if !watch.deadline.is_some_and(|d| d <= now) {
                continue;
            }
            watch.deadline = None;
            let viewport = watch.viewport;
            fired += 1;
            refit(self.bridge.as_ref(), entry, viewport);
        }
        fired
    }

    /// View unmounted. Only the size watch goes away.
    pub fn detach_view(&mut self, panel_id: PanelId) {
        if let Some(entry) = self.sessions.get_mut(&panel_id) {
            entry.resize_watch = None;
        }
    }

    /// End a session: drop its data paths, pending resize and emulator state,
    /// and terminate its process. Unknown ids are ignored.
    pub fn destroy(&mut self, panel_id: PanelId) {
        let Some(attached) = self.sessions.remove(&panel_id).map(|e| e.is_attached()) else {
            return;
        };

        if attached {
            if let Err(e) = self.bridge.destroy(panel_id) {
                tracing::warn!("{}", e);
            }
        }
        tracing::info!("Destroyed session for panel {}", panel_id);
    }

    /// Keystrokes or pasted text from the view
    pub fn input(&mut self, panel_id: PanelId, bytes: &[u8]) {
        let Some(entry) = self.sessions.get(&panel_id) else {
            return;
        };
        if entry.exited || !entry.subscribed(Subscription::Input) {
            return;
        }
        if let Err(e) = self.bridge.write(panel_id, bytes) {
            tracing::debug!("Dropped input: {}", e);
        }
    }

    /// Route one process event to its session
    pub fn handle_event(&mut self, event: PtyEvent) {
        let Some(entry) = self.sessions.get_mut(&event.panel_id) else {
            tracing::trace!("Event for unknown panel {}", event.panel_id);
            return;
        };
        if entry.exited {
            return;
        }
        match event.kind {
            PtyEventKind::Data(bytes) => {
                if !entry.subscribed(Subscription::Output) {
                    return;
                }
                entry.emulator.write(&bytes);
                if entry.emulator.take_title_changed() {
                    tracing::debug!(
                        "Panel {} title is now {:?}",
                        event.panel_id,
                        entry.emulator.title()
                    );
                }
                let replies = entry.emulator.take_replies();
                if !replies.is_empty() && entry.subscribed(Subscription::Input) {
                    if let Err(e) = self.bridge.write(event.panel_id, &replies) {
                        tracing::debug!("Dropped emulator reply: {}", e);
                    }
                }
            }
            PtyEventKind::Exit(code) => {
                if !entry.subscribed(Subscription::Exit) {
                    return;
                }
                entry.emulator.write(EXIT_MARKER);
                entry.exited = true;
                tracing::info!("Panel {} process exited ({:?})", event.panel_id, code);
            }
        }
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next process event and handle it. Returns false once
    /// the process side has gone away.
    pub async fn process_next(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Pick up the latest settings snapshot. Only an appearance change
    /// touches live sessions. Returns true if it did.
    pub fn sync_settings(&mut self) -> bool {
        if !self.settings.has_changed().unwrap_or(false) {
            return false;
        }
        let appearance = self.settings.borrow_and_update().appearance.clone();
        if appearance == self.appearance {
            return false;
        }
        self.apply_appearance(appearance);
        true
    }

    /// Push display options to every live session and re-fit mounted views
    pub fn apply_appearance(&mut self, appearance: AppearanceConfig) {
        tracing::debug!("Applying appearance to {} session(s)", self.sessions.len());
        for entry in self.sessions.values_mut() {
            entry.emulator.apply_appearance(&appearance);
            if let Some(watch) = entry.resize_watch {
                refit(self.bridge.as_ref(), entry, watch.viewport);
            }
        }
        self.appearance = appearance;
    }

    pub fn appearance(&self) -> &AppearanceConfig {
        &self.appearance
    }
}

/// Fit the emulator to `viewport` and tell the process about a changed size.
/// Failures are expected while a process is going away and are swallowed.
fn refit(bridge: &dyn PtyBridge, entry: &mut SessionEntry, viewport: Viewport) {
    let Some(size) = entry.emulator.fit(viewport) else {
        return;
    };
    tracing::trace!(
        "Panel {} resized to {}x{}",
        entry.panel_id,
        size.cols,
        size.rows
    );
    if !entry.is_attached() || entry.exited {
        return;
    }
    if let Err(e) = bridge.resize(entry.panel_id, size) {
        tracing::debug!("Ignored resize failure: {}", e);
    }
}

impl SessionTeardown for SessionRegistry {
    fn destroy_session(&mut self, panel_id: PanelId) {
        self.destroy(panel_id);
    }
}
