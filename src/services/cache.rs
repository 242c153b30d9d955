use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::Params;
use crate::config::AppConfig;
use crate::models::DataTable;

/// On-disk response cache: one JSON file per (api name, params) request,
/// expired by file age. Cache failures are logged and treated as misses so
/// a broken cache never blocks a fetch.
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub files: usize,
    pub total_bytes: u64,
    pub expired: usize,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create cache directory {}: {}", dir.display(), e);
        }
        Self { dir, ttl }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.cache_dir.clone(), config.cache_ttl)
    }

    // One readable file name per request: api name plus sorted key=value
    // pairs, everything outside [A-Za-z0-9._=-] replaced by underscores.
    fn cache_file(&self, api_name: &str, params: &Params) -> PathBuf {
        let mut key = String::from(api_name);
        for (name, value) in params {
            key.push('_');
            key.push_str(name);
            key.push('=');
            key.push_str(&plain_value(value));
        }

        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '=' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        self.dir.join(format!("{sanitized}.json"))
    }

    /// Cached table for a request, or None on miss/expiry/corruption
    pub fn load(&self, api_name: &str, params: &Params) -> Option<DataTable> {
        let path = self.cache_file(api_name, params);
        let metadata = fs::metadata(&path).ok()?;

        let age = metadata.modified().ok()?.elapsed().ok()?;
        if age > self.ttl {
            debug!(
                "Cache expired for {} (age {}s > ttl {}s)",
                path.display(),
                age.as_secs(),
                self.ttl.as_secs()
            );
            let _ = fs::remove_file(&path);
            return None;
        }

        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(table) => {
                debug!("Cache hit: {}", path.display());
                Some(table)
            }
            Err(e) => {
                warn!("Discarding unreadable cache file {}: {}", path.display(), e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Write a response table for a request
    pub fn store(&self, api_name: &str, params: &Params, table: &DataTable) {
        let path = self.cache_file(api_name, params);
        match serde_json::to_string(table) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    warn!("Failed to write cache file {}: {}", path.display(), e);
                } else {
                    debug!("Cached {} rows at {}", table.len(), path.display());
                }
            }
            Err(e) => warn!("Failed to serialize response for cache: {}", e),
        }
    }

    /// Remove every cache file, returning how many were deleted
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove only files older than the TTL, returning how many were deleted
    pub fn remove_expired(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            let expired = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .is_some_and(|age| age > self.ttl);
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn stats(&self) -> io::Result<CacheStats> {
        let mut stats = CacheStats::default();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            stats.files += 1;
            stats.total_bytes += metadata.len();
            let expired = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .is_some_and(|age| age > self.ttl);
            if expired {
                stats.expired += 1;
            }
        }
        Ok(stats)
    }
}

// String values go into file names verbatim, everything else via JSON text
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DataTable {
        DataTable::new(
            vec!["ts_code".into(), "close".into()],
            vec![vec!["000001.SZ".into(), 14.32.into()]],
        )
    }

    fn sample_params() -> Params {
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from("000001.SZ"));
        params.insert("start_date".into(), Value::from("20230104"));
        params
    }

    #[test]
    fn test_round_trip_returns_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));
        let table = sample_table();
        let params = sample_params();

        cache.store("daily", &params, &table);
        assert_eq!(cache.load("daily", &params), Some(table));
    }

    #[test]
    fn test_miss_on_unknown_request() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));
        assert_eq!(cache.load("daily", &sample_params()), None);
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::ZERO);
        let params = sample_params();

        cache.store("daily", &params, &sample_table());
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.load("daily", &params), None);
        assert_eq!(cache.stats().unwrap().files, 0);
    }

    #[test]
    fn test_distinct_params_use_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));

        let mut other = sample_params();
        other.insert("end_date".into(), Value::from("20230611"));

        cache.store("daily", &sample_params(), &sample_table());
        cache.store("daily", &other, &DataTable::empty());

        assert_eq!(cache.load("daily", &sample_params()), Some(sample_table()));
        assert_eq!(cache.load("daily", &other), Some(DataTable::empty()));
        assert_eq!(cache.stats().unwrap().files, 2);
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));
        let params = sample_params();

        fs::write(cache.cache_file("daily", &params), "not json").unwrap();
        assert_eq!(cache.load("daily", &params), None);
        assert_eq!(cache.stats().unwrap().files, 0);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));

        cache.store("daily", &sample_params(), &sample_table());
        cache.store("stock_basic", &Params::new(), &sample_table());

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn test_filenames_stay_readable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600));
        let path = cache.cache_file("daily", &sample_params());
        let name = path.file_name().unwrap().to_string_lossy();
        assert_eq!(name, "daily_start_date=20230104_ts_code=000001.SZ.json");
    }
}
