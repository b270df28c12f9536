use crate::Message;
use crate::timeline::layering::MarkPalette;
use iced::widget::{column, container, row, text};
use iced::{Color, Element, Length};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "EVENTLINE_CONFIG";
pub const CONFIG_FILE: &str = "eventline.ron";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// User configuration, read from a RON file. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tween_ms: u64,
    pub marker_height: f32,
    pub lane_height: f32,
    pub foreground_opacity: f32,
    pub background: String,
    pub selection: String,
    pub pinned_outline: String,
    /// Empty means every event gets a color derived from its id.
    pub default_event: String,
    /// Zoom ladder rungs in milliseconds; empty keeps the built-in ladder.
    pub zoom_presets_ms: Vec<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tween_ms: 1000,
            marker_height: 12.0,
            lane_height: 40.0,
            foreground_opacity: 0.5,
            background: "#ffffff".to_string(),
            selection: "#0066cc".to_string(),
            pinned_outline: "#d95900".to_string(),
            default_event: String::new(),
            zoom_presets_ms: Vec::new(),
        }
    }
}

impl Settings {
    pub fn parse(source: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// `$EVENTLINE_CONFIG` when set, otherwise `./eventline.ron` if it exists.
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE);
        local.exists().then_some(local)
    }

    pub fn tween(&self) -> Duration {
        Duration::from_millis(self.tween_ms)
    }

    /// Colors that fail to parse fall back to the default palette entry.
    pub fn palette(&self) -> MarkPalette {
        let defaults = MarkPalette::default();
        MarkPalette {
            background: parse_hex_color(&self.background).unwrap_or(defaults.background),
            selection: parse_hex_color(&self.selection).unwrap_or(defaults.selection),
            pinned_outline: parse_hex_color(&self.pinned_outline)
                .unwrap_or(defaults.pinned_outline),
            default_event: parse_hex_color(&self.default_event),
            foreground_opacity: if (0.0..=1.0).contains(&self.foreground_opacity) {
                self.foreground_opacity
            } else {
                defaults.foreground_opacity
            },
            marker_height: if self.marker_height > 0.0 {
                self.marker_height
            } else {
                defaults.marker_height
            },
        }
    }

    pub fn lane_height(&self) -> f32 {
        if self.lane_height > 0.0 {
            self.lane_height
        } else {
            Settings::default().lane_height
        }
    }

    /// Key bindings and the active configuration, shown in the side panel.
    pub fn hints(&self, source: Option<&Path>) -> Element<'_, Message> {
        let binding = |key: &'static str, action: &'static str| {
            row![
                text(key).width(Length::Fixed(150.0)).size(12),
                text(action).size(12)
            ]
        };

        let source = match source {
            Some(path) => format!("Config: {}", path.display()),
            None => "Config: built-in defaults".to_string(),
        };

        let hints = column![
            text("Hints").size(16),
            binding("Mouse wheel:", "Zoom in or out around the cursor"),
            binding("Left drag:", "Pan the timeline"),
            binding("Shift + left drag:", "Select a range to zoom into"),
            binding("Double click:", "Reset to the full range"),
            binding("Drag a trim edge:", "Adjust the trim range"),
            binding("Left click on event:", "Select it and show details"),
            text(source).size(11),
            text(format!("Tween: {} ms", self.tween_ms)).size(11),
        ]
        .spacing(6)
        .padding(6);

        container(hints)
            .width(Length::Fill)
            .style(|_theme: &iced::Theme| {
                container::Style::default().background(Color::from_rgb(0.99, 0.99, 0.99))
            })
            .into()
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` (the `#` is optional).
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color::from_rgba8(r, g, b, a as f32 / 255.0))
}
