// ABOUTME: Tab and focus state machine over layout trees.
// ABOUTME: Applies user edits atomically and requests session teardown for closed panels.

use xmux_core::{NodeId, PanelId, TabId};

use crate::tree::{Direction, LayoutTree, Sizes, Zone};

/// Receives teardown requests for panels that the user closed.
///
/// Implemented by the session registry; the store never touches session state
/// beyond this call.
pub trait SessionTeardown {
    fn destroy_session(&mut self, panel_id: PanelId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub layout: LayoutTree,
    pub focused_panel_id: PanelId,
}

impl Tab {
    fn new(title: String) -> Self {
        let panel_id = PanelId::new();
        Self {
            id: TabId::new(),
            title,
            layout: LayoutTree::new(panel_id),
            focused_panel_id: panel_id,
        }
    }
}

/// Result of [`PanelStore::close_panel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelClosed {
    /// The panel is not in the active tab; nothing happened
    NotFound,
    /// The panel's leaf was removed and the tab survives with this focus
    Collapsed { focus: PanelId },
    /// The panel was the tab's last one, so the tab was closed
    TabClosed { tab_id: TabId },
}

/// Owns every tab and its layout. There is always at least one tab and
/// exactly one of them is active.
#[derive(Debug, Clone)]
pub struct PanelStore {
    tabs: Vec<Tab>,
    active_tab_id: TabId,
}

impl PanelStore {
    pub fn new() -> Self {
        let tab = Tab::new(Self::title_for(1));
        Self {
            active_tab_id: tab.id,
            tabs: vec![tab],
        }
    }

    fn title_for(n: usize) -> String {
        format!("Terminal {}", n)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active_tab_id(&self) -> TabId {
        self.active_tab_id
    }

    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.active_index()]
    }

    pub fn tab(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    /// Leaf node currently rendering `panel_id` in the active tab
    pub fn leaf_id_for_panel(&self, panel_id: PanelId) -> Option<NodeId> {
        self.active_tab()
            .layout
            .find_leaf_by_panel_id(panel_id)
            .map(|leaf| leaf.id)
    }

    fn active_index(&self) -> usize {
        // `tabs` is never empty and `active_tab_id` always names one of them
        self.tabs
            .iter()
            .position(|t| t.id == self.active_tab_id)
            .unwrap_or(0)
    }

    fn active_tab_mut(&mut self) -> &mut Tab {
        let idx = self.active_index();
        &mut self.tabs[idx]
    }

    /// Append a single-panel tab and make it active
    pub fn add_tab(&mut self) -> TabId {
        let tab = Tab::new(Self::title_for(self.tabs.len() + 1));
        let id = tab.id;
        tracing::info!("Added tab {} ({})", id, tab.title);
        self.tabs.push(tab);
        self.active_tab_id = id;
        id
    }

    /// Close a tab and every session in it. Unknown ids are ignored.
    pub fn remove_tab(&mut self, tab_id: TabId, sessions: &mut impl SessionTeardown) {
        let Some(idx) = self.tabs.iter().position(|t| t.id == tab_id) else {
            return;
        };
        // Sessions go first so none can outlive the tab
        for panel_id in self.tabs[idx].layout.all_panel_ids() {
            sessions.destroy_session(panel_id);
        }
        self.drop_tab_at(idx);
    }

    fn drop_tab_at(&mut self, idx: usize) {
        let removed = self.tabs.remove(idx);
        tracing::info!("Removed tab {} ({})", removed.id, removed.title);

        if self.tabs.is_empty() {
            let tab = Tab::new(Self::title_for(1));
            self.active_tab_id = tab.id;
            self.tabs.push(tab);
        } else if self.active_tab_id == removed.id {
            self.active_tab_id = self.tabs[idx.min(self.tabs.len() - 1)].id;
        }
    }

    /// Returns false if the tab does not exist
    pub fn set_active_tab(&mut self, tab_id: TabId) -> bool {
        if self.tab(tab_id).is_none() {
            return false;
        }
        self.active_tab_id = tab_id;
        true
    }

    pub fn rename_tab(&mut self, tab_id: TabId, title: impl Into<String>) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.title = title.into();
        }
    }

    /// Split `panel_id`'s leaf in the active tab and focus the new panel.
    /// Returns the new panel's id, or `None` if the panel is not in the active tab.
    pub fn split_panel(
        &mut self,
        panel_id: PanelId,
        direction: Direction,
        insert_after: bool,
    ) -> Option<PanelId> {
        let tab = self.active_tab_mut();
        let leaf = tab.layout.find_leaf_by_panel_id(panel_id)?;
        let new_panel_id = PanelId::new();
        tab.layout = tab
            .layout
            .split_leaf(leaf.id, new_panel_id, direction, insert_after);
        tab.focused_panel_id = new_panel_id;
        tracing::debug!("Split panel {} {:?}, new panel {}", panel_id, direction, new_panel_id);
        Some(new_panel_id)
    }

    /// Close a panel of the active tab: its session is destroyed before the
    /// layout changes. Closing the last panel closes the tab.
    pub fn close_panel(
        &mut self,
        panel_id: PanelId,
        sessions: &mut impl SessionTeardown,
    ) -> PanelClosed {
        let idx = self.active_index();
        if !self.tabs[idx].layout.contains_panel(panel_id) {
            return PanelClosed::NotFound;
        }

        sessions.destroy_session(panel_id);

        let tab = &mut self.tabs[idx];
        match tab.layout.remove_panel(panel_id) {
            Some(layout) => {
                if tab.focused_panel_id == panel_id {
                    if let Some(first) = layout.all_panel_ids().first() {
                        tab.focused_panel_id = *first;
                    }
                }
                tab.layout = layout;
                tracing::debug!("Closed panel {}", panel_id);
                PanelClosed::Collapsed {
                    focus: tab.focused_panel_id,
                }
            }
            None => {
                let tab_id = tab.id;
                self.drop_tab_at(idx);
                PanelClosed::TabClosed { tab_id }
            }
        }
    }

    /// Focus a panel of the active tab. The id is not checked against the layout.
    pub fn focus_panel(&mut self, panel_id: PanelId) {
        self.active_tab_mut().focused_panel_id = panel_id;
    }

    pub fn swap_panels(&mut self, a: PanelId, b: PanelId) {
        let tab = self.active_tab_mut();
        tab.layout = tab.layout.swap_panels(a, b);
    }

    /// Move a panel next to a target leaf and focus it
    pub fn move_panel_to_zone(&mut self, source_panel_id: PanelId, target_leaf_id: NodeId, zone: Zone) {
        let tab = self.active_tab_mut();
        tab.layout = tab
            .layout
            .move_panel_to_split(source_panel_id, target_leaf_id, zone);
        tab.focused_panel_id = source_panel_id;
    }

    /// Handle a drag-and-drop: the center zone swaps with the target's panel,
    /// edge zones move the source next to the target.
    pub fn drop_panel(&mut self, source_panel_id: PanelId, target_leaf_id: NodeId, zone: Zone) {
        if zone != Zone::Center {
            self.move_panel_to_zone(source_panel_id, target_leaf_id, zone);
            return;
        }
        let target = self
            .active_tab()
            .layout
            .find_panel_by_leaf_id(target_leaf_id);
        if let Some(target_panel_id) = target.filter(|p| *p != source_panel_id) {
            self.swap_panels(source_panel_id, target_panel_id);
        }
    }

    /// Resize a split of the active tab; cheap enough to call on every drag step
    pub fn update_split_sizes(&mut self, split_id: NodeId, sizes: Sizes) {
        let tab = self.active_tab_mut();
        tab.layout = tab.layout.update_sizes(split_id, sizes);
    }
}

impl Default for PanelStore {
    fn default() -> Self {
        Self::new()
    }
}
