use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Saves and loads typed row collections as CSV or JSON files in the data
/// directory. Empty inputs are skipped with a warning, missing files load
/// as empty collections; both mirror how fetched tables behave.
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create data directory {}: {}", dir.display(), e);
        }
        Self { dir }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Write rows as CSV. Returns the written path, or None when skipped.
    pub fn save_csv<T: Serialize>(
        &self,
        rows: &[T],
        filename: &str,
    ) -> anyhow::Result<Option<PathBuf>> {
        if rows.is_empty() {
            warn!("Nothing to save, skipping {}", filename);
            return Ok(None);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let content = String::from_utf8(writer.into_inner()?)?;

        let path = self.path(filename);
        fs::write(&path, content)?;
        info!("Saved {} rows to {}", rows.len(), path.display());
        Ok(Some(path))
    }

    pub fn load_csv<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<Vec<T>> {
        let path = self.path(filename);
        if !path.exists() {
            warn!("File does not exist: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for result in reader.deserialize() {
            rows.push(result?);
        }
        Ok(rows)
    }

    /// Write rows as pretty-printed JSON records. Returns the written path,
    /// or None when skipped.
    pub fn save_json<T: Serialize>(
        &self,
        rows: &[T],
        filename: &str,
    ) -> anyhow::Result<Option<PathBuf>> {
        if rows.is_empty() {
            warn!("Nothing to save, skipping {}", filename);
            return Ok(None);
        }

        let content = serde_json::to_string_pretty(rows)?;
        let path = self.path(filename);
        fs::write(&path, content)?;
        info!("Saved {} rows to {}", rows.len(), path.display());
        Ok(Some(path))
    }

    /// Write a single record as pretty-printed JSON.
    pub fn save_json_value<T: Serialize>(
        &self,
        value: &T,
        filename: &str,
    ) -> anyhow::Result<PathBuf> {
        let content = serde_json::to_string_pretty(value)?;
        let path = self.path(filename);
        fs::write(&path, content)?;
        info!("Saved {}", path.display());
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<Vec<T>> {
        let path = self.path(filename);
        if !path.exists() {
            warn!("File does not exist: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyBar;

    fn bars() -> Vec<DailyBar> {
        vec![
            DailyBar {
                ts_code: "000001.SZ".into(),
                trade_date: "20230104".into(),
                open: 13.71,
                high: 14.42,
                low: 13.63,
                close: 14.32,
                pre_close: Some(13.66),
                change: Some(0.66),
                pct_chg: Some(4.8316),
                vol: 2_189_682.53,
                amount: Some(3_106_086.447),
            },
            DailyBar {
                ts_code: "000001.SZ".into(),
                trade_date: "20230105".into(),
                open: 14.40,
                high: 14.74,
                low: 14.37,
                close: 14.48,
                pre_close: Some(14.32),
                change: None,
                pct_chg: None,
                vol: 1_665_425.0,
                amount: None,
            },
        ]
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let rows = bars();

        let path = store.save_csv(&rows, "bars.csv").unwrap().unwrap();
        assert!(path.exists());

        let loaded: Vec<DailyBar> = store.load_csv("bars.csv").unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let rows = bars();

        store.save_json(&rows, "bars.json").unwrap().unwrap();
        let loaded: Vec<DailyBar> = store.load_json("bars.json").unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let rows: Vec<DailyBar> = Vec::new();

        assert!(store.save_csv(&rows, "empty.csv").unwrap().is_none());
        assert!(store.save_json(&rows, "empty.json").unwrap().is_none());
        assert!(!store.path("empty.csv").exists());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let loaded: Vec<DailyBar> = store.load_csv("absent.csv").unwrap();
        assert!(loaded.is_empty());
    }
}
