// ABOUTME: Application settings handling.
// ABOUTME: Loads and saves appearance, shortcut and shell settings from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{TerminalTheme, ThemeChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    #[default]
    Block,
    Bar,
    Underline,
}

/// Everything that changes how a live terminal looks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub theme: ThemeChoice,

    /// CSS-style font stack, first available family wins
    pub font_family: String,

    /// Font size in pixels
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_height: f32,

    pub cursor_style: CursorStyle,
    pub cursor_blink: bool,

    /// Lines of history kept per terminal
    pub scrollback: usize,

    /// Palette used when `theme` is `Custom`
    pub custom_theme: TerminalTheme,
}

impl AppearanceConfig {
    pub const FONT_SIZE_RANGE: (f32, f32) = (8.0, 32.0);
    pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 2.0);
    pub const SCROLLBACK_RANGE: (usize, usize) = (500, 100_000);

    /// The palette currently in effect
    pub fn resolved_theme(&self) -> TerminalTheme {
        crate::resolve_theme(self.theme, Some(&self.custom_theme))
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: ThemeChoice::TokyoNight,
            font_family: r#""JetBrains Mono", "Cascadia Code", "Fira Code", Menlo, monospace"#
                .to_string(),
            font_size: 13.0,
            line_height: 1.2,
            cursor_style: CursorStyle::Block,
            cursor_blink: true,
            scrollback: 5000,
            custom_theme: TerminalTheme::tokyo_night(),
        }
    }
}

/// Accelerator strings for the global shortcuts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub new_tab: String,
    pub split_horizontal: String,
    pub split_vertical: String,
    pub close_panel: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            new_tab: "CommandOrControl+T".to_string(),
            split_horizontal: "CommandOrControl+D".to_string(),
            split_vertical: "CommandOrControl+Shift+D".to_string(),
            close_panel: "CommandOrControl+W".to_string(),
        }
    }
}

/// Shell settings. Empty strings mean "use the environment default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    pub shell_path: String,
    pub starting_directory: String,
}

impl GeneralConfig {
    /// Shell to spawn: configured path, then `$SHELL`, then `/bin/bash`
    pub fn shell(&self) -> String {
        if !self.shell_path.trim().is_empty() {
            return self.shell_path.clone();
        }
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
    }

    /// Working directory for new shells: configured directory, then home, then `/`
    pub fn working_directory(&self) -> PathBuf {
        if !self.starting_directory.trim().is_empty() {
            return PathBuf::from(&self.starting_directory);
        }
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub appearance: AppearanceConfig,
    pub shortcuts: ShortcutConfig,
    pub general: GeneralConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl Settings {
    /// Get the default settings file path (~/.config/xmux/settings.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xmux").join("settings.toml"))
    }

    /// Load settings from a path, clamping out-of-range values
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings.sanitized())
    }

    /// Load settings from default path, or return defaults if missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(SettingsError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to a path
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp numeric values into their supported ranges and replace a broken custom palette
    pub fn sanitized(mut self) -> Self {
        let a = &mut self.appearance;
        let (min, max) = AppearanceConfig::FONT_SIZE_RANGE;
        a.font_size = clamp_or(a.font_size, min, max, 13.0);
        let (min, max) = AppearanceConfig::LINE_HEIGHT_RANGE;
        a.line_height = clamp_or(a.line_height, min, max, 1.2);
        let (min, max) = AppearanceConfig::SCROLLBACK_RANGE;
        a.scrollback = a.scrollback.clamp(min, max);
        if !a.custom_theme.is_valid() {
            tracing::warn!("Custom theme contains invalid colors, using defaults");
            a.custom_theme = TerminalTheme::default();
        }
        self
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
