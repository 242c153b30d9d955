use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Tushare Pro HTTP endpoint
pub const DEFAULT_API_URL: &str = "http://api.tushare.pro";

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
    pub retry_times: u32,
    pub cache_ttl: Duration,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub chart_width: usize,
    pub chart_height: usize,
}

impl AppConfig {
    // Load all configuration from environment variables
    pub fn from_env() -> Self {
        load_dotenv_files();

        let token = env::var("TUSHARE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if token.is_none() {
            tracing::warn!(
                "TUSHARE_TOKEN is not set; API calls will fail. \
                 Register at https://tushare.pro/ and put the token in .env"
            );
        }

        let api_url = env::var("TUSHARE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_secs: u64 = env::var("TUSHARE_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30); // Default to 30 seconds

        let retry_times: u32 = env::var("TUSHARE_RETRY_TIMES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3); // Default to 3 attempts

        let cache_ttl_secs: u64 = env::var("TUSHARE_CACHE_TTL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600); // Default to 1 hour

        let data_dir = path_from_env("DATA_DIR", "data");
        let cache_dir = path_from_env("CACHE_DIR", "cache");
        let charts_dir = path_from_env("CHARTS_DIR", "charts");

        let chart_width: usize = env::var("CHART_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1200);

        let chart_height: usize = env::var("CHART_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(800);

        let config = Self {
            token,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            retry_times,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            data_dir,
            cache_dir,
            charts_dir,
            chart_width,
            chart_height,
        };

        config.ensure_dirs();
        config
    }

    /// Token for API calls, or an error when it is missing or malformed
    pub fn require_token(&self) -> anyhow::Result<&str> {
        match &self.token {
            Some(token) if token_looks_valid(token) => Ok(token),
            Some(_) => anyhow::bail!(
                "TUSHARE_TOKEN looks malformed (expected at least 30 characters)"
            ),
            None => anyhow::bail!("TUSHARE_TOKEN is not set"),
        }
    }

    /// Whether a plausible token is configured
    pub fn has_valid_token(&self) -> bool {
        self.token.as_deref().is_some_and(token_looks_valid)
    }

    pub fn data_path(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    pub fn cache_path(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    pub fn chart_path(&self, filename: &str) -> PathBuf {
        self.charts_dir.join(filename)
    }

    fn ensure_dirs(&self) {
        for dir in [&self.data_dir, &self.cache_dir, &self.charts_dir] {
            if let Err(e) = fs::create_dir_all(dir) {
                tracing::warn!("Failed to create directory {}: {}", dir.display(), e);
            }
        }
    }
}

// Try .env, then .env.local, then ~/.tushare.env; first hit wins
fn load_dotenv_files() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    if dotenvy::from_filename(".env.local").is_ok() {
        return;
    }
    if let Some(home) = env::var_os("HOME") {
        let _ = dotenvy::from_path(Path::new(&home).join(".tushare.env"));
    }
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// Cheap shape check for a Tushare token (real tokens are long hex strings)
pub fn token_looks_valid(token: &str) -> bool {
    token.trim().len() >= 30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape_check() {
        assert!(token_looks_valid(
            "0123456789abcdef0123456789abcdef01234567"
        ));
        assert!(!token_looks_valid("short"));
        assert!(!token_looks_valid(""));
    }

    #[test]
    fn test_require_token_rejects_missing_and_short() {
        let mut config = AppConfig {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry_times: 3,
            cache_ttl: Duration::from_secs(3600),
            data_dir: PathBuf::from("data"),
            cache_dir: PathBuf::from("cache"),
            charts_dir: PathBuf::from("charts"),
            chart_width: 1200,
            chart_height: 800,
        };
        assert!(config.require_token().is_err());

        config.token = Some("tooshort".to_string());
        assert!(config.require_token().is_err());

        config.token = Some("0123456789abcdef0123456789abcdef01234567".to_string());
        assert_eq!(
            config.require_token().unwrap(),
            "0123456789abcdef0123456789abcdef01234567"
        );
    }
}
