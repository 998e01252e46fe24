//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service under test
    #[serde(default)]
    pub target: TargetConfig,

    /// Suite execution settings
    #[serde(default)]
    pub suite: SuiteConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Service under test
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Root URL every step path is appended to
    pub base_url: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Suite execution settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Maximum number of scenarios running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Budget for the whole suite, unset means unbounded
    pub timeout_secs: Option<u64>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: None,
        }
    }
}

fn default_concurrency() -> usize {
    1
}

/// Report output settings
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Write a JSON report to this file
    pub json: Option<PathBuf>,
}

/// Values given on the command line, applied over the file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub suite_timeout_secs: Option<u64>,
    pub report_json: Option<PathBuf>,
}

/// Fully resolved settings for one `run` invocation
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub concurrency: usize,
    pub suite_timeout: Option<Duration>,
    pub report_json: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path or the default config file
    ///
    /// Returns default configuration if the default file doesn't exist. An
    /// explicit path that doesn't exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Merge command line overrides and validate the result
    pub fn resolve(&self, overrides: Overrides) -> Result<RunSettings> {
        let base_url = overrides
            .base_url
            .or_else(|| self.target.base_url.clone())
            .ok_or_else(|| {
                Error::Config(
                    "No base URL configured. Pass --base-url or set target.base_url".to_string(),
                )
            })?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let timeout_secs = overrides.timeout_secs.unwrap_or(self.target.timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::Config("Request timeout must be at least 1 second".to_string()));
        }

        let concurrency = overrides.concurrency.unwrap_or(self.suite.concurrency);
        if concurrency == 0 {
            return Err(Error::Config("Concurrency must be at least 1".to_string()));
        }

        Ok(RunSettings {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            concurrency,
            suite_timeout: overrides
                .suite_timeout_secs
                .or(self.suite.timeout_secs)
                .map(Duration::from_secs),
            report_json: overrides.report_json.or_else(|| self.report.json.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.target.timeout_secs, 30);
        assert_eq!(config.suite.concurrency, 1);
        assert!(config.suite.timeout_secs.is_none());
        assert!(config.report.json.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
[target]
base_url = "https://api-desafio-qa.onrender.com"
timeout_secs = 10

[suite]
concurrency = 4
timeout_secs = 300

[report]
json = "out/report.json"
"#,
        )
        .unwrap();

        let settings = config.resolve(Overrides::default()).unwrap();
        assert_eq!(settings.base_url, "https://api-desafio-qa.onrender.com");
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.suite_timeout, Some(Duration::from_secs(300)));
        assert_eq!(settings.report_json, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = Config::parse(
            r#"
[target]
base_url = "http://from-file"
"#,
        )
        .unwrap();

        let settings = config
            .resolve(Overrides {
                base_url: Some("http://from-cli".to_string()),
                concurrency: Some(8),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(settings.base_url, "http://from-cli");
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let err = Config::default().resolve(Overrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = Config::default();
        let bad_scheme = config.resolve(Overrides {
            base_url: Some("ftp://host".to_string()),
            ..Overrides::default()
        });
        assert!(bad_scheme.is_err());

        let zero_workers = config.resolve(Overrides {
            base_url: Some("http://host".to_string()),
            concurrency: Some(0),
            ..Overrides::default()
        });
        assert!(zero_workers.is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("[target]\nbase = \"x\"\n").is_err());
    }
}
