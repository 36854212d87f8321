// ABOUTME: Composition of the panel store and the session registry behind the console.
// ABOUTME: Reconciles mounted views with the active layout after every change, like a UI re-render.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use xmux_core::{PanelId, SettingsStore, Viewport};
use xmux_layout::{LayoutNode, PanelClosed, PanelStore, Split};
use xmux_terminal::SessionRegistry;

use crate::command::{Command, HELP};

/// Pixels of padding around each panel's content
const PANEL_PADDING: f32 = 8.0;

/// Whether the console loop keeps running
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(Option<String>),
    Quit,
}

pub struct Workspace {
    panels: PanelStore,
    sessions: SessionRegistry,
    window: Viewport,
    /// Panels whose view is currently mounted, with the container size each was given
    mounted: HashMap<PanelId, Viewport>,
}

impl Workspace {
    pub fn new(sessions: SessionRegistry, window: Viewport) -> Self {
        let mut workspace = Self {
            panels: PanelStore::new(),
            sessions,
            window,
            mounted: HashMap::new(),
        };
        workspace.reconcile(Instant::now());
        workspace
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    /// Container size of each panel of the active tab
    fn visible_viewports(&self) -> HashMap<PanelId, Viewport> {
        let window = self.window;
        self.panels
            .active_tab()
            .layout
            .panel_rects()
            .into_iter()
            .map(|(panel_id, rect)| {
                let width = (rect.width as f32 * window.width - PANEL_PADDING * 2.0).max(0.0);
                let height = (rect.height as f32 * window.height - PANEL_PADDING * 2.0).max(0.0);
                (panel_id, Viewport::new(width, height))
            })
            .collect()
    }

    /// Bring mounted views in line with the active layout: unmount what
    /// disappeared, mount what appeared, report size changes of the rest.
    pub fn reconcile(&mut self, now: Instant) {
        let visible = self.visible_viewports();

        let gone: Vec<PanelId> = self
            .mounted
            .keys()
            .filter(|id| !visible.contains_key(id))
            .copied()
            .collect();
        for panel_id in gone {
            self.mounted.remove(&panel_id);
            self.sessions.detach_view(panel_id);
        }

        for (panel_id, viewport) in visible {
            match self.mounted.insert(panel_id, viewport) {
                None => {
                    self.sessions.resolve(panel_id);
                    self.sessions.attach(panel_id, viewport);
                    self.sessions.observe_resize(panel_id, viewport, now);
                }
                Some(previous) if previous != viewport => {
                    self.sessions.notify_resize(panel_id, viewport, now);
                }
                Some(_) => {}
            }
        }
    }

    fn panel_at(&self, n: usize) -> Result<PanelId> {
        self.panels
            .active_tab()
            .layout
            .all_panel_ids()
            .get(n - 1)
            .copied()
            .ok_or_else(|| anyhow!("no panel {n}"))
    }

    fn split_at(&self, n: usize) -> Result<&Split> {
        let mut splits = Vec::new();
        collect_splits(self.panels.active_tab().layout.root(), &mut splits);
        splits
            .get(n - 1)
            .copied()
            .ok_or_else(|| anyhow!("no split {n}"))
    }

    fn focused(&self) -> PanelId {
        self.panels.active_tab().focused_panel_id
    }

    /// Run one command against the workspace
    pub fn execute(
        &mut self,
        command: Command,
        settings: &SettingsStore,
        now: Instant,
    ) -> Result<Flow> {
        let mut reply = None;
        match command {
            Command::NewTab => {
                self.panels.add_tab();
            }
            Command::CloseTab(n) => {
                let tab_id = match n {
                    Some(n) => self
                        .panels
                        .tabs()
                        .get(n - 1)
                        .map(|t| t.id)
                        .ok_or_else(|| anyhow!("no tab {n}"))?,
                    None => self.panels.active_tab_id(),
                };
                self.panels.remove_tab(tab_id, &mut self.sessions);
            }
            Command::SelectTab(n) => {
                let tab_id = self
                    .panels
                    .tabs()
                    .get(n - 1)
                    .map(|t| t.id)
                    .ok_or_else(|| anyhow!("no tab {n}"))?;
                self.panels.set_active_tab(tab_id);
            }
            Command::RenameTab(title) => {
                let tab_id = self.panels.active_tab_id();
                self.panels.rename_tab(tab_id, title);
            }
            Command::Split {
                direction,
                insert_after,
            } => {
                let focused = self.focused();
                self.panels.split_panel(focused, direction, insert_after);
            }
            Command::Close(n) => {
                let panel_id = match n {
                    Some(n) => self.panel_at(n)?,
                    None => self.focused(),
                };
                if let PanelClosed::TabClosed { .. } =
                    self.panels.close_panel(panel_id, &mut self.sessions)
                {
                    reply = Some("Closed the tab's last panel".to_string());
                }
            }
            Command::Focus(n) => {
                let panel_id = self.panel_at(n)?;
                self.panels.focus_panel(panel_id);
            }
            Command::Swap(a, b) => {
                let (a, b) = (self.panel_at(a)?, self.panel_at(b)?);
                self.panels.swap_panels(a, b);
            }
            Command::Drop {
                source,
                target,
                zone,
            } => {
                let source = self.panel_at(source)?;
                let target = self.panel_at(target)?;
                let target_leaf = self
                    .panels
                    .leaf_id_for_panel(target)
                    .ok_or_else(|| anyhow!("panel has no leaf"))?;
                self.panels.drop_panel(source, target_leaf, zone);
            }
            Command::Resize {
                split,
                first_percent,
            } => {
                let split_id = self.split_at(split)?.id;
                self.panels
                    .update_split_sizes(split_id, [first_percent, 100.0 - first_percent]);
            }
            Command::Send(text) => {
                let mut bytes = text.into_bytes();
                bytes.push(b'\r');
                let focused = self.focused();
                self.sessions.input(focused, &bytes);
            }
            Command::Window { width, height } => {
                self.window = Viewport::new(width, height);
            }
            Command::Theme(theme) => {
                settings
                    .update(|s| s.appearance.theme = theme)
                    .context("Failed to save settings")?;
                self.sessions.sync_settings();
            }
            Command::FontSize(size) => {
                settings
                    .update(|s| s.appearance.font_size = size)
                    .context("Failed to save settings")?;
                self.sessions.sync_settings();
            }
            Command::Show => reply = Some(self.describe()?),
            Command::Screen(n) => {
                let panel_id = match n {
                    Some(n) => self.panel_at(n)?,
                    None => self.focused(),
                };
                let entry = self
                    .sessions
                    .get(panel_id)
                    .ok_or_else(|| anyhow!("panel {panel_id} has no session"))?;
                reply = Some(entry.emulator().screen_text());
            }
            Command::Help => reply = Some(HELP.to_string()),
            Command::Quit => return Ok(Flow::Quit),
        }
        self.reconcile(now);
        Ok(Flow::Continue(reply))
    }

    /// Human-readable summary of the tabs plus the active layout as JSON
    pub fn describe(&self) -> Result<String> {
        let mut out = String::new();
        let active = self.panels.active_tab_id();
        for (i, tab) in self.panels.tabs().iter().enumerate() {
            let marker = if tab.id == active { '*' } else { ' ' };
            writeln!(out, "{marker} {}. {}", i + 1, tab.title)?;
        }

        let appearance = self.sessions.appearance();
        let palette = appearance.resolved_theme();
        writeln!(
            out,
            "theme {} (background {}, foreground {})",
            appearance.theme.label(),
            palette.background,
            palette.foreground
        )?;

        let tab = self.panels.active_tab();
        for (i, panel_id) in tab.layout.all_panel_ids().into_iter().enumerate() {
            let focus = if panel_id == tab.focused_panel_id { '>' } else { ' ' };
            let title = self.sessions.title(panel_id).unwrap_or_default();
            let size = self
                .sessions
                .get(panel_id)
                .map(|e| e.emulator().size())
                .unwrap_or_default();
            writeln!(
                out,
                "{focus} panel {} [{}] {}x{} {}",
                i + 1,
                panel_id,
                size.cols,
                size.rows,
                title
            )?;
        }

        let json = serde_json::to_string_pretty(&tab.layout).context("Failed to encode layout")?;
        out.push_str(&json);
        Ok(out)
    }
}

fn collect_splits<'a>(node: &'a LayoutNode, out: &mut Vec<&'a Split>) {
    if let LayoutNode::Split(split) = node {
        out.push(split);
        collect_splits(&split.children[0], out);
        collect_splits(&split.children[1], out);
    }
}
