//! Pipeline configuration
//!
//! Settings come from a YAML file; every section has defaults so a partial
//! (or absent) file works. The API key is supplied out-of-band through the
//! `TMDB_API_KEY` environment variable, never through the settings file.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// HTTP and retry settings for the catalog API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the movie catalog API.
    pub base_url: String,
    /// Per-request timeout in seconds. There is no end-to-end deadline.
    pub timeout_secs: u64,
    /// Retries per page after the initial attempt, transient failures only.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
    /// Courtesy delay between successive page requests.
    pub rate_limit_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            rate_limit_delay_ms: 250,
        }
    }
}

/// What to fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Upper bound on the number of movies collected per run.
    pub target_count: usize,
    /// Discover sort criterion, e.g. "popularity.desc" or "revenue.desc".
    pub sort_by: String,
    /// Fetch per-movie details with credits after the discover pass.
    pub fetch_credits: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            target_count: 200,
            sort_by: "popularity.desc".to_string(),
            fetch_credits: true,
        }
    }
}

/// Output directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Raw fetch audit files, one JSON file per run.
    pub raw_dir: PathBuf,
    /// Cleaned dataset (CSV + JSON).
    pub processed_dir: PathBuf,
    /// KPI and aggregate reports.
    pub reports_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            reports_dir: PathBuf::from("data/reports"),
        }
    }
}

/// Thresholds applied to rankings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rows per ranking table.
    pub top_n: usize,
    /// Minimum votes for rating-based rankings.
    pub min_vote_count: u64,
    /// Minimum budget (millions USD) for ROI rankings.
    pub min_budget_musd: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_n: 10,
            min_vote_count: 10,
            min_budget_musd: 10.0,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub fetch: FetchSettings,
    pub paths: PathSettings,
    pub analysis: AnalysisSettings,
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("Invalid settings in {}: {}", path.display(), e)))
    }
}

/// Read the API key from the environment.
pub fn api_key_from_env() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AppError::Auth(format!("{} is not set", API_KEY_ENV))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let settings = Settings::default();
        assert_eq!(settings.fetch.target_count, 200);
        assert_eq!(settings.api.max_retries, 3);
        assert_eq!(settings.paths.raw_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "fetch:\n  target_count: 25\napi:\n  timeout_secs: 5\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.fetch.target_count, 25);
        assert_eq!(settings.api.timeout_secs, 5);
        // untouched sections keep their defaults
        assert_eq!(settings.fetch.sort_by, "popularity.desc");
        assert_eq!(settings.analysis.top_n, 10);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "fetch:\n  sort_by: revenue.desc").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.fetch.sort_by, "revenue.desc");
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::File::create(&path).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.fetch.target_count, 200);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Settings::load(Path::new("/nonexistent/settings.yaml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
