use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prompts::LibraryPreference;
use crate::session::GenerationSettings;
use crate::theme::{AccentColor, ThemeConfig, ThemeMode};

/// Main configuration structure, stored at `~/.autoedit/config.toml`.
/// The API key is deliberately not part of it; it only ever comes from
/// the `GEMINI_API_KEY` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub theme: ThemeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model used for the streaming code-generation call.
    pub code_model: String,

    /// Cheaper model used for the follow-up explanation call.
    pub explain_model: String,

    /// Low temperature keeps the generated scripts deterministic.
    pub temperature: f32,

    /// Hard cap on response length. Scripts longer than this get
    /// truncated by the service.
    pub max_output_tokens: u32,

    /// Editing library preselected at startup.
    pub default_library: LibraryPreference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSettings {
    pub mode: ThemeMode,
    pub accent: AccentColor,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".autoedit").join("config.toml"))
    }

    /// Directory for on-disk state (history, recordings).
    pub fn data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".autoedit"))
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            code_model: self.llm.code_model.clone(),
            explain_model: self.llm.explain_model.clone(),
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_output_tokens,
        }
    }

    pub fn theme(&self) -> ThemeConfig {
        ThemeConfig::new(self.theme.mode, self.theme.accent)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                code_model: "gemini-3-pro-preview".to_string(),
                explain_model: "gemini-3-flash-preview".to_string(),
                temperature: 0.2,
                max_output_tokens: 8192,
                default_library: LibraryPreference::MoviePy,
            },
            theme: ThemeSettings {
                mode: ThemeMode::Dark,
                accent: AccentColor::Blue,
            },
        }
    }
}

/// Load the config, creating a default file on first run.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = if let Some(p) = path {
        p.to_path_buf()
    } else {
        AppConfig::default_path()?
    };

    if config_path.exists() {
        AppConfig::load(&config_path)
    } else {
        let config = AppConfig::default();
        config.save(&config_path)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.max_output_tokens, 8192);
        assert_eq!(config.llm.default_library, LibraryPreference::MoviePy);
        assert_eq!(config.theme.accent, AccentColor::Blue);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.llm.default_library = LibraryPreference::FfmpegPython;
        config.save(&config_path).unwrap();

        let loaded = AppConfig::load(&config_path).unwrap();
        assert_eq!(loaded.llm.default_library, LibraryPreference::FfmpegPython);
        assert_eq!(loaded.llm.code_model, config.llm.code_model);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = load_or_create_config(Some(&config_path)).unwrap();
        assert!(config_path.exists());
        assert_eq!(config.llm.temperature, 0.2);
    }

    #[test]
    fn test_generation_settings_carried_over() {
        let config = AppConfig::default();
        let settings = config.generation_settings();
        assert_eq!(settings.code_model, "gemini-3-pro-preview");
        assert_eq!(settings.explain_model, "gemini-3-flash-preview");
    }
}
