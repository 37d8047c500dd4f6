//! JSON File Source - Snapshot File Reader
//!
//! Reads the latest match snapshots from a JSON array on disk. An
//! external collector rewrites the file (tmp + rename) between polls,
//! so every read sees a complete document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::ports::odds_source::{MatchSnapshot, OddsSource};

/// `OddsSource` backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    /// Path to the snapshot file.
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading `path` on every fetch.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OddsSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_snapshots(&self) -> Result<Vec<MatchSnapshot>> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", self.path.display()))?;

        let snapshots: Vec<MatchSnapshot> =
            serde_json::from_str(&content).context("Failed to parse snapshot file")?;

        debug!(matches = snapshots.len(), "Snapshots loaded");
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::OutcomeKey;

    const SNAPSHOTS: &str = r#"[
      {
        "match_id": "epl-1",
        "home_team": "Arsenal",
        "away_team": "Chelsea",
        "prediction": {
          "home_win": 0.5, "draw": 0.27, "away_win": 0.23,
          "expected_home_goals": 1.6, "expected_away_goals": 1.1,
          "confidence": 0.8
        },
        "odds": [
          {"bookmaker": "alpha", "prices": {"home_win": 2.1, "draw": 3.5, "away_win": 3.8, "over_2_5": 1.9}}
        ]
      }
    ]"#;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("odds-sentinel-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reads_snapshots() {
        let path = temp_file("ok.json", SNAPSHOTS);
        let source = JsonFileSource::new(&path);

        let snapshots = source.fetch_snapshots().await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].label(), "Arsenal vs Chelsea");
        assert!(!snapshots[0].closing);
        assert_eq!(snapshots[0].odds[0].get(OutcomeKey::Over25), Some(1.9));
        assert!(snapshots[0].prediction.over_2_5.is_none());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_errors() {
        let source = JsonFileSource::new("/nonexistent/snapshots.json");
        assert!(source.fetch_snapshots().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_file_errors() {
        let path = temp_file("bad.json", "{ not json");
        let source = JsonFileSource::new(&path);
        assert!(source.fetch_snapshots().await.is_err());
        std::fs::remove_file(path).ok();
    }
}
