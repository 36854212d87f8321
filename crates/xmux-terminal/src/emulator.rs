// ABOUTME: Terminal emulator state wrapping alacritty_terminal.
// ABOUTME: Parses process output into a cell grid and collects replies and title changes.

use std::sync::Arc;

use alacritty_terminal::event::{Event, EventListener};
use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::index::{Column, Line};
use alacritty_terminal::term::{Config, Term};
use alacritty_terminal::vte::ansi::{CursorShape, CursorStyle as TermCursorStyle, Processor};
use parking_lot::Mutex;
use xmux_core::{AppearanceConfig, CellMetrics, CursorStyle, GridSize, Viewport};

/// Events raised by the emulator while parsing, drained by the owner
#[derive(Default)]
struct Pending {
    /// Bytes the emulator wants sent back to the process (DSR, DA, ...)
    replies: Vec<u8>,
    title: Option<String>,
    title_changed: bool,
}

/// Proxy for terminal events
#[derive(Clone, Default)]
struct EventProxy {
    pending: Arc<Mutex<Pending>>,
}

impl EventListener for EventProxy {
    fn send_event(&self, event: Event) {
        let mut pending = self.pending.lock();
        match event {
            Event::PtyWrite(text) => pending.replies.extend_from_slice(text.as_bytes()),
            Event::Title(title) => {
                pending.title = Some(title);
                pending.title_changed = true;
            }
            Event::ResetTitle => {
                pending.title = None;
                pending.title_changed = true;
            }
            _ => {}
        }
    }
}

/// Simple size type that implements Dimensions
struct TermSize {
    columns: usize,
    lines: usize,
}

impl From<GridSize> for TermSize {
    fn from(size: GridSize) -> Self {
        Self {
            columns: size.cols as usize,
            lines: size.rows as usize,
        }
    }
}

impl Dimensions for TermSize {
    fn columns(&self) -> usize {
        self.columns
    }

    fn screen_lines(&self) -> usize {
        self.lines
    }

    fn total_lines(&self) -> usize {
        self.lines
    }
}

/// Screen state for one session. Owns no process; bytes come in through
/// [`Emulator::write`] and replies leave through [`Emulator::take_replies`].
pub struct Emulator {
    term: Term<EventProxy>,
    parser: Processor,
    proxy: EventProxy,
    metrics: CellMetrics,
}

impl Emulator {
    pub fn new(appearance: &AppearanceConfig) -> Self {
        let proxy = EventProxy::default();
        let size = TermSize::from(GridSize::default());
        let term = Term::new(term_config(appearance), &size, proxy.clone());
        Self {
            term,
            parser: Processor::new(),
            proxy,
            metrics: CellMetrics::from_appearance(appearance),
        }
    }

    /// Feed process output through the parser
    pub fn write(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.term, bytes);
    }

    /// Bytes queued for the process since the last call
    pub fn take_replies(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.proxy.pending.lock().replies)
    }

    /// Latest window title set by the running program, if any
    pub fn title(&self) -> Option<String> {
        self.proxy.pending.lock().title.clone()
    }

    /// Whether the title changed since the last call
    pub fn take_title_changed(&mut self) -> bool {
        std::mem::take(&mut self.proxy.pending.lock().title_changed)
    }

    pub fn size(&self) -> GridSize {
        GridSize {
            cols: self.term.columns() as u16,
            rows: self.term.screen_lines() as u16,
        }
    }

    /// Resize the grid. Returns false when the size is unchanged.
    pub fn resize(&mut self, size: GridSize) -> bool {
        if size == self.size() {
            return false;
        }
        self.term.resize(TermSize::from(size));
        true
    }

    /// Resize the grid to fill `viewport`. Returns the new size when it changed.
    pub fn fit(&mut self, viewport: Viewport) -> Option<GridSize> {
        let size = self.metrics.fit(viewport)?;
        self.resize(size).then_some(size)
    }

    /// Apply display options from new appearance settings
    pub fn apply_appearance(&mut self, appearance: &AppearanceConfig) {
        self.term.set_options(term_config(appearance));
        self.metrics = CellMetrics::from_appearance(appearance);
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Visible screen as text, one line per row with trailing blanks trimmed
    pub fn screen_text(&self) -> String {
        let grid = self.term.grid();
        let mut lines = Vec::with_capacity(grid.screen_lines());
        for line in 0..grid.screen_lines() {
            let row = &grid[Line(line as i32)];
            let text: String = (0..grid.columns()).map(|col| row[Column(col)].c).collect();
            lines.push(text.trim_end().to_string());
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

fn term_config(appearance: &AppearanceConfig) -> Config {
    let shape = match appearance.cursor_style {
        CursorStyle::Block => CursorShape::Block,
        CursorStyle::Bar => CursorShape::Beam,
        CursorStyle::Underline => CursorShape::Underline,
    };
    Config {
        scrolling_history: appearance.scrollback,
        default_cursor_style: TermCursorStyle {
            shape,
            blinking: appearance.cursor_blink,
        },
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator() -> Emulator {
        Emulator::new(&AppearanceConfig::default())
    }

    #[test]
    fn starts_at_default_size() {
        assert_eq!(emulator().size(), GridSize { cols: 80, rows: 24 });
    }

    #[test]
    fn output_lands_on_screen() {
        let mut emu = emulator();
        emu.write(b"hello\r\nworld");
        assert_eq!(emu.screen_text(), "hello\nworld");
    }

    #[test]
    fn resize_reports_change() {
        let mut emu = emulator();
        let size = GridSize { cols: 40, rows: 10 };
        assert!(emu.resize(size));
        assert!(!emu.resize(size));
        assert_eq!(emu.size(), size);
    }

    #[test]
    fn fit_uses_cell_metrics() {
        let mut emu = emulator();
        let metrics = emu.metrics();
        let viewport = Viewport::new(metrics.width * 50.5, metrics.height * 20.5);
        assert_eq!(emu.fit(viewport), Some(GridSize { cols: 50, rows: 20 }));
        assert_eq!(emu.fit(viewport), None);
    }

    #[test]
    fn empty_viewport_does_not_fit() {
        let mut emu = emulator();
        assert_eq!(emu.fit(Viewport::new(0.0, 0.0)), None);
        assert_eq!(emu.size(), GridSize::default());
    }

    #[test]
    fn device_status_report_queues_reply() {
        let mut emu = emulator();
        emu.write(b"ab\x1b[6n");
        assert_eq!(emu.take_replies(), b"\x1b[1;3R".to_vec());
        assert!(emu.take_replies().is_empty());
    }

    #[test]
    fn osc_title_is_captured() {
        let mut emu = emulator();
        emu.write(b"\x1b]0;vim main.rs\x07");
        assert_eq!(emu.title().as_deref(), Some("vim main.rs"));
        assert!(emu.take_title_changed());
        assert!(!emu.take_title_changed());
    }

    #[test]
    fn larger_font_shrinks_grid_fit() {
        let mut emu = emulator();
        let viewport = Viewport::new(800.0, 600.0);
        let before = emu.fit(viewport).unwrap();

        let mut appearance = AppearanceConfig::default();
        appearance.font_size = 26.0;
        emu.apply_appearance(&appearance);
        let after = emu.fit(viewport).unwrap();

        assert!(after.cols < before.cols);
        assert!(after.rows < before.rows);
    }
}
