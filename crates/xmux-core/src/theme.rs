// ABOUTME: Terminal color themes.
// ABOUTME: Named presets plus a user-defined custom palette, stored as hex strings.

use serde::{Deserialize, Serialize};

use crate::Color;

/// A 16-color terminal palette plus cursor, selection and fg/bg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalTheme {
    pub background: String,
    pub foreground: String,
    pub cursor: String,
    pub cursor_accent: String,
    pub selection_background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_foreground: Option<String>,
    /// ANSI colors 0-15 (8 normal + 8 bright)
    pub colors: [String; 16],
}

impl TerminalTheme {
    fn preset(base: [&str; 5], selection_foreground: Option<&str>, colors: [&str; 16]) -> Self {
        Self {
            background: base[0].to_string(),
            foreground: base[1].to_string(),
            cursor: base[2].to_string(),
            cursor_accent: base[3].to_string(),
            selection_background: base[4].to_string(),
            selection_foreground: selection_foreground.map(str::to_string),
            colors: colors.map(str::to_string),
        }
    }

    /// Every color parses as hex
    pub fn is_valid(&self) -> bool {
        [
            &self.background,
            &self.foreground,
            &self.cursor,
            &self.cursor_accent,
            &self.selection_background,
        ]
        .into_iter()
        .chain(self.selection_foreground.as_ref())
        .chain(self.colors.iter())
        .all(|hex| Color::from_hex(hex).is_some())
    }

    pub fn tokyo_night() -> Self {
        Self::preset(
            ["#1a1b26", "#c0caf5", "#c0caf5", "#1a1b26", "#364a82"],
            Some("#c0caf5"),
            [
                "#15161e", "#f7768e", "#9ece6a", "#e0af68", "#7aa2f7", "#bb9af7", "#7dcfff", "#a9b1d6",
                "#414868", "#f7768e", "#9ece6a", "#e0af68", "#7aa2f7", "#bb9af7", "#7dcfff", "#c0caf5",
            ],
        )
    }

    pub fn dracula() -> Self {
        Self::preset(
            ["#282a36", "#f8f8f2", "#f8f8f2", "#282a36", "#44475a"],
            None,
            [
                "#21222c", "#ff5555", "#50fa7b", "#f1fa8c", "#bd93f9", "#ff79c6", "#8be9fd", "#f8f8f2",
                "#6272a4", "#ff6e6e", "#69ff94", "#ffffa5", "#d6acff", "#ff92df", "#a4ffff", "#ffffff",
            ],
        )
    }

    pub fn one_dark() -> Self {
        Self::preset(
            ["#282c34", "#abb2bf", "#528bff", "#282c34", "#3e4451"],
            None,
            [
                "#1e2127", "#e06c75", "#98c379", "#d19a66", "#61afef", "#c678dd", "#56b6c2", "#abb2bf",
                "#5c6370", "#e06c75", "#98c379", "#d19a66", "#61afef", "#c678dd", "#56b6c2", "#ffffff",
            ],
        )
    }

    pub fn nord() -> Self {
        Self::preset(
            ["#2e3440", "#d8dee9", "#d8dee9", "#2e3440", "#434c5e"],
            None,
            [
                "#3b4252", "#bf616a", "#a3be8c", "#ebcb8b", "#81a1c1", "#b48ead", "#88c0d0", "#e5e9f0",
                "#4c566a", "#bf616a", "#a3be8c", "#ebcb8b", "#81a1c1", "#b48ead", "#8fbcbb", "#eceff4",
            ],
        )
    }

    pub fn gruvbox_dark() -> Self {
        Self::preset(
            ["#282828", "#ebdbb2", "#ebdbb2", "#282828", "#504945"],
            None,
            [
                "#282828", "#cc241d", "#98971a", "#d79921", "#458588", "#b16286", "#689d6a", "#a89984",
                "#928374", "#fb4934", "#b8bb26", "#fabd2f", "#83a598", "#d3869b", "#8ec07c", "#ebdbb2",
            ],
        )
    }

    pub fn catppuccin_mocha() -> Self {
        Self::preset(
            ["#1e1e2e", "#cdd6f4", "#f5e0dc", "#1e1e2e", "#45475a"],
            None,
            [
                "#45475a", "#f38ba8", "#a6e3a1", "#f9e2af", "#89b4fa", "#f5c2e7", "#94e2d5", "#bac2de",
                "#585b70", "#f38ba8", "#a6e3a1", "#f9e2af", "#89b4fa", "#f5c2e7", "#94e2d5", "#a6adc8",
            ],
        )
    }

    pub fn solarized_dark() -> Self {
        Self::preset(
            ["#002b36", "#839496", "#839496", "#002b36", "#073642"],
            None,
            [
                "#073642", "#dc322f", "#859900", "#b58900", "#268bd2", "#d33682", "#2aa198", "#eee8d5",
                "#586e75", "#cb4b16", "#586e75", "#657b83", "#839496", "#6c71c4", "#93a1a1", "#fdf6e3",
            ],
        )
    }

    pub fn solarized_light() -> Self {
        Self::preset(
            ["#fdf6e3", "#657b83", "#657b83", "#fdf6e3", "#eee8d5"],
            None,
            [
                "#073642", "#dc322f", "#859900", "#b58900", "#268bd2", "#d33682", "#2aa198", "#eee8d5",
                "#586e75", "#cb4b16", "#586e75", "#657b83", "#839496", "#6c71c4", "#93a1a1", "#fdf6e3",
            ],
        )
    }

    pub fn github_dark() -> Self {
        Self::preset(
            ["#0d1117", "#c9d1d9", "#c9d1d9", "#0d1117", "#264f78"],
            None,
            [
                "#484f58", "#ff7b72", "#3fb950", "#d29922", "#58a6ff", "#bc8cff", "#39c5cf", "#b1bac4",
                "#6e7681", "#ffa198", "#56d364", "#e3b341", "#79c0ff", "#d2a8ff", "#56d4dd", "#f0f6fc",
            ],
        )
    }

    pub fn rose_pine() -> Self {
        Self::preset(
            ["#191724", "#e0def4", "#524f67", "#e0def4", "#2a283e"],
            None,
            [
                "#26233a", "#eb6f92", "#31748f", "#f6c177", "#9ccfd8", "#c4a7e7", "#ebbcba", "#e0def4",
                "#6e6a86", "#eb6f92", "#31748f", "#f6c177", "#9ccfd8", "#c4a7e7", "#ebbcba", "#e0def4",
            ],
        )
    }
}

impl Default for TerminalTheme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

/// Which theme the appearance settings select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ThemeChoice {
    #[default]
    #[serde(rename = "Tokyo Night")]
    TokyoNight,
    Dracula,
    #[serde(rename = "One Dark")]
    OneDark,
    Nord,
    #[serde(rename = "Gruvbox Dark")]
    GruvboxDark,
    #[serde(rename = "Catppuccin Mocha")]
    CatppuccinMocha,
    #[serde(rename = "Solarized Dark")]
    SolarizedDark,
    #[serde(rename = "Solarized Light")]
    SolarizedLight,
    #[serde(rename = "GitHub Dark")]
    GithubDark,
    #[serde(rename = "Rosé Pine")]
    RosePine,
    Custom,
}

impl ThemeChoice {
    pub fn all() -> &'static [ThemeChoice] {
        &[
            ThemeChoice::TokyoNight,
            ThemeChoice::Dracula,
            ThemeChoice::OneDark,
            ThemeChoice::Nord,
            ThemeChoice::GruvboxDark,
            ThemeChoice::CatppuccinMocha,
            ThemeChoice::SolarizedDark,
            ThemeChoice::SolarizedLight,
            ThemeChoice::GithubDark,
            ThemeChoice::RosePine,
            ThemeChoice::Custom,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemeChoice::TokyoNight => "Tokyo Night",
            ThemeChoice::Dracula => "Dracula",
            ThemeChoice::OneDark => "One Dark",
            ThemeChoice::Nord => "Nord",
            ThemeChoice::GruvboxDark => "Gruvbox Dark",
            ThemeChoice::CatppuccinMocha => "Catppuccin Mocha",
            ThemeChoice::SolarizedDark => "Solarized Dark",
            ThemeChoice::SolarizedLight => "Solarized Light",
            ThemeChoice::GithubDark => "GitHub Dark",
            ThemeChoice::RosePine => "Rosé Pine",
            ThemeChoice::Custom => "Custom",
        }
    }
}

/// Resolve the effective palette. `Custom` uses the user's palette when one is given.
pub fn resolve_theme(choice: ThemeChoice, custom: Option<&TerminalTheme>) -> TerminalTheme {
    match choice {
        ThemeChoice::TokyoNight => TerminalTheme::tokyo_night(),
        ThemeChoice::Dracula => TerminalTheme::dracula(),
        ThemeChoice::OneDark => TerminalTheme::one_dark(),
        ThemeChoice::Nord => TerminalTheme::nord(),
        ThemeChoice::GruvboxDark => TerminalTheme::gruvbox_dark(),
        ThemeChoice::CatppuccinMocha => TerminalTheme::catppuccin_mocha(),
        ThemeChoice::SolarizedDark => TerminalTheme::solarized_dark(),
        ThemeChoice::SolarizedLight => TerminalTheme::solarized_light(),
        ThemeChoice::GithubDark => TerminalTheme::github_dark(),
        ThemeChoice::RosePine => TerminalTheme::rose_pine(),
        ThemeChoice::Custom => custom.cloned().unwrap_or_default(),
    }
}
