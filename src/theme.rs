use std::str::FromStr;

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// Light/dark terminal rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    Light,
}

/// The accent palette offered in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    Blue,
    Purple,
    Green,
    Orange,
    Red,
}

impl AccentColor {
    pub const ALL: [AccentColor; 5] = [
        AccentColor::Blue,
        AccentColor::Purple,
        AccentColor::Green,
        AccentColor::Orange,
        AccentColor::Red,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AccentColor::Blue => "blue",
            AccentColor::Purple => "purple",
            AccentColor::Green => "green",
            AccentColor::Orange => "orange",
            AccentColor::Red => "red",
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            AccentColor::Blue => "#0078d4",
            AccentColor::Purple => "#8b5cf6",
            AccentColor::Green => "#10b981",
            AccentColor::Orange => "#f97316",
            AccentColor::Red => "#ef4444",
        }
    }

    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            AccentColor::Blue => (0x00, 0x78, 0xd4),
            AccentColor::Purple => (0x8b, 0x5c, 0xf6),
            AccentColor::Green => (0x10, 0xb9, 0x81),
            AccentColor::Orange => (0xf9, 0x73, 0x16),
            AccentColor::Red => (0xef, 0x44, 0x44),
        }
    }
}

impl FromStr for AccentColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blue" => Ok(AccentColor::Blue),
            "purple" => Ok(AccentColor::Purple),
            "green" => Ok(AccentColor::Green),
            "orange" => Ok(AccentColor::Orange),
            "red" => Ok(AccentColor::Red),
            other => anyhow::bail!(
                "Unknown accent color: {}. Available: blue, purple, green, orange, red",
                other
            ),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => anyhow::bail!("Unknown theme mode: {}. Available: dark, light", other),
        }
    }
}

/// Explicit theme value passed to the rendering code. Replaces the
/// previous approach of mutating shared style state as a side channel:
/// initialize once from config, update via the setters, read everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ThemeConfig {
    pub mode: ThemeMode,
    pub accent: AccentColor,
}

impl ThemeConfig {
    pub fn new(mode: ThemeMode, accent: AccentColor) -> Self {
        Self { mode, accent }
    }

    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
    }

    pub fn set_accent(&mut self, accent: AccentColor) {
        self.accent = accent;
    }

    /// Paint a string with the active accent color.
    pub fn accent(&self, text: &str) -> ColoredString {
        let (r, g, b) = self.accent.rgb();
        text.truecolor(r, g, b)
    }

    /// Secondary text: dimmed on dark terminals, plain on light ones
    /// where dimming tends to be unreadable.
    pub fn secondary(&self, text: &str) -> ColoredString {
        match self.mode {
            ThemeMode::Dark => text.dimmed(),
            ThemeMode::Light => text.normal(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self::new(ThemeMode::Dark, AccentColor::Blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_parse() {
        assert_eq!("purple".parse::<AccentColor>().unwrap(), AccentColor::Purple);
        assert_eq!("GREEN".parse::<AccentColor>().unwrap(), AccentColor::Green);
        assert!("magenta".parse::<AccentColor>().is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("dark".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert_eq!("Light".parse::<ThemeMode>().unwrap(), ThemeMode::Light);
        assert!("solarized".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_palette_hex_values() {
        assert_eq!(AccentColor::Blue.hex(), "#0078d4");
        assert_eq!(AccentColor::Red.hex(), "#ef4444");
        assert_eq!(AccentColor::ALL.len(), 5);
    }

    #[test]
    fn test_update_lifecycle() {
        let mut theme = ThemeConfig::default();
        assert_eq!(theme.accent.name(), "blue");
        theme.set_accent(AccentColor::Orange);
        theme.set_mode(ThemeMode::Light);
        assert_eq!(theme.accent.name(), "orange");
        assert_eq!(theme.mode, ThemeMode::Light);
    }
}
