use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One generation run that was actually sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub prompt: String,
    pub timestamp: DateTime<Local>,
    pub library: String,
}

impl HistoryItem {
    pub fn new(prompt: String, library: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            timestamp: Local::now(),
            library,
        }
    }
}

/// Append-only prompt log at `~/.autoedit/history.json`.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, item: HistoryItem) -> Result<()> {
        let mut items = self.load_all()?;
        items.push(item);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(&items).context("Failed to serialize history")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write history to {}", self.path.display()))?;

        Ok(())
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryItem>> {
        let mut items = self.load_all()?;
        items.reverse();
        items.truncate(limit);
        Ok(items)
    }

    fn load_all(&self) -> Result<Vec<HistoryItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history from {}", self.path.display()))?;
        serde_json::from_str(&content).context("Failed to parse history file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_recent() {
        let temp_dir = TempDir::new().unwrap();
        let log = HistoryLog::new(temp_dir.path().join("history.json"));

        log.append(HistoryItem::new("first".to_string(), "MoviePy".to_string()))
            .unwrap();
        log.append(HistoryItem::new("second".to_string(), "OpenCV".to_string()))
            .unwrap();

        let recent = log.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prompt, "second");
        assert_eq!(recent[1].prompt, "first");
    }

    #[test]
    fn test_recent_respects_limit() {
        let temp_dir = TempDir::new().unwrap();
        let log = HistoryLog::new(temp_dir.path().join("history.json"));

        for i in 0..5 {
            log.append(HistoryItem::new(format!("prompt {}", i), "MoviePy".to_string()))
                .unwrap();
        }

        let recent = log.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prompt, "prompt 4");
    }

    #[test]
    fn test_empty_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = HistoryLog::new(temp_dir.path().join("missing.json"));
        assert!(log.recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = HistoryItem::new("x".to_string(), "MoviePy".to_string());
        let b = HistoryItem::new("x".to_string(), "MoviePy".to_string());
        assert_ne!(a.id, b.id);
    }
}
