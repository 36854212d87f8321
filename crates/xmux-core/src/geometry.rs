// ABOUTME: Grid and viewport geometry shared by the layout and terminal crates.
// ABOUTME: Converts a container's pixel size into terminal columns and rows.

use serde::{Deserialize, Serialize};

use crate::AppearanceConfig;

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u16,
    pub rows: u16,
}

impl GridSize {
    pub const MIN_COLS: u16 = 2;
    pub const MIN_ROWS: u16 = 1;

    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// Size of the container a panel is rendered into, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A collapsed or not-yet-laid-out container cannot be fitted
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Pixel size of one character cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
}

impl CellMetrics {
    /// Advance width of a typical monospace glyph relative to the font size
    const GLYPH_ASPECT: f32 = 0.6;

    pub fn from_appearance(appearance: &AppearanceConfig) -> Self {
        Self {
            width: appearance.font_size * Self::GLYPH_ASPECT,
            height: appearance.font_size * appearance.line_height,
        }
    }

    /// Largest grid that fits in the viewport. `None` if the viewport is empty.
    pub fn fit(&self, viewport: Viewport) -> Option<GridSize> {
        if viewport.is_empty() || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let cols = (viewport.width / self.width).floor().min(u16::MAX as f32) as u16;
        let rows = (viewport.height / self.height).floor().min(u16::MAX as f32) as u16;
        Some(GridSize {
            cols: cols.max(GridSize::MIN_COLS),
            rows: rows.max(GridSize::MIN_ROWS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> CellMetrics {
        CellMetrics {
            width: 8.0,
            height: 16.0,
        }
    }

    #[test]
    fn fit_rounds_down() {
        let size = metrics().fit(Viewport::new(810.0, 390.0)).unwrap();
        assert_eq!(size, GridSize::new(101, 24));
    }

    #[test]
    fn fit_respects_minimums() {
        let size = metrics().fit(Viewport::new(3.0, 3.0)).unwrap();
        assert_eq!(size, GridSize::new(2, 1));
    }

    #[test]
    fn empty_viewport_does_not_fit() {
        assert!(metrics().fit(Viewport::new(0.0, 300.0)).is_none());
        assert!(metrics().fit(Viewport::new(f32::NAN, 300.0)).is_none());
    }

    #[test]
    fn metrics_follow_font() {
        let appearance = AppearanceConfig {
            font_size: 10.0,
            line_height: 1.5,
            ..AppearanceConfig::default()
        };
        let m = CellMetrics::from_appearance(&appearance);
        assert!((m.width - 6.0).abs() < 0.001);
        assert!((m.height - 15.0).abs() < 0.001);
    }
}
