use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::{config_path, reports_dir};
use crate::workflow::WorkflowTimings;

/// Environment variable that overrides the analysis service base URL
pub const SERVICE_URL_ENV: &str = "THYROSCAN_SERVICE_URL";

/// Example configuration file contents (written on first run)
pub const EXAMPLE_CONFIG: &str = r#"# ThyroScan configuration

[service]
# Base URL of the analysis service (serves /predict, /generate_report, /health)
base_url = "http://localhost:5000"
# Upper bound for a single /predict call
request_timeout_secs = 45

[workflow]
# Guided path: when the preprocessing and analysis stages are shown
preprocess_after_ms = 1500
analyze_after_ms = 3500

[reports]
# output_dir = "/path/to/reports"
"#;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Analysis service connection settings
    pub service: ServiceConfig,
    /// Guided path choreography
    pub workflow: WorkflowConfig,
    /// Directory exported reports are written to
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowConfig {
    pub preprocess_after: Duration,
    pub analyze_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://localhost:5000".to_string(),
                request_timeout: Duration::from_secs(45),
            },
            workflow: WorkflowConfig {
                preprocess_after: Duration::from_millis(1500),
                analyze_after: Duration::from_millis(3500),
            },
            reports_dir: reports_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServiceConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlWorkflowConfig {
    pub preprocess_after_ms: Option<u64>,
    pub analyze_after_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlReportsConfig {
    pub output_dir: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub service: Option<TomlServiceConfig>,
    pub workflow: Option<TomlWorkflowConfig>,
    pub reports: Option<TomlReportsConfig>,
}

impl Config {
    /// Load configuration from ~/.thyroscan/config.toml, falling back to defaults
    pub fn load() -> Self {
        let config_file = config_path();

        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        let mut config = Self::load_from(&config_file);
        config.apply_env();
        config
    }

    /// Load configuration from an explicit file. Missing or unparsable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let Ok(contents) = fs::read_to_string(path) else {
            return config;
        };

        match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => config.merge(toml_config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
            }
        }

        config
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(service) = toml_config.service {
            if let Some(base_url) = service.base_url {
                self.service.base_url = base_url.trim_end_matches('/').to_string();
            }
            if let Some(secs) = service.request_timeout_secs {
                self.service.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(workflow) = toml_config.workflow {
            if let Some(ms) = workflow.preprocess_after_ms {
                self.workflow.preprocess_after = Duration::from_millis(ms);
            }
            if let Some(ms) = workflow.analyze_after_ms {
                self.workflow.analyze_after = Duration::from_millis(ms);
            }
        }

        // Analysis can never be shown before preprocessing
        if self.workflow.analyze_after < self.workflow.preprocess_after {
            self.workflow.analyze_after = self.workflow.preprocess_after;
        }

        if let Some(dir) = toml_config.reports.and_then(|r| r.output_dir) {
            self.reports_dir = dir;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                self.service.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
    }

    /// Timings handed to the scan workflow
    pub fn workflow_timings(&self) -> WorkflowTimings {
        WorkflowTimings {
            preprocess_after: self.workflow.preprocess_after,
            analyze_after: self.workflow.analyze_after,
            request_timeout: self.service.request_timeout,
        }
    }

    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!(error = %e, "Could not create config directory");
                return;
            }
        }
        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::debug!(path = %path.display(), error = %e, "Could not write example config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:5000");
        assert_eq!(config.service.request_timeout, Duration::from_secs(45));
        assert_eq!(config.workflow.preprocess_after, Duration::from_millis(1500));
        assert_eq!(config.workflow.analyze_after, Duration::from_millis(3500));
    }

    #[test]
    fn test_example_config_parses() {
        let parsed: TomlConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        let service = parsed.service.unwrap();
        assert_eq!(service.base_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(service.request_timeout_secs, Some(45));
    }

    #[test]
    fn test_load_from_merges_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[service]\nbase_url = \"https://scan.example.org/\"\n\n[workflow]\nanalyze_after_ms = 500\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.service.base_url, "https://scan.example.org");
        assert_eq!(config.service.request_timeout, Duration::from_secs(45));
        // analyze_after is clamped to preprocess_after
        assert_eq!(config.workflow.analyze_after, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service\nbase_url = ").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.service.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_workflow_timings() {
        let timings = Config::default().workflow_timings();
        assert_eq!(timings.request_timeout, Duration::from_secs(45));
        assert_eq!(timings.analyze_after, Duration::from_millis(3500));
    }
}
