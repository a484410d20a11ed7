//! Client configuration: TOML file with environment overrides.
//!
//! Everything has a usable default so the client runs against a local
//! backend with no config file at all.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::masking::MaskingPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Environment override for the backend base URL.
pub const BASE_URL_ENV_VAR: &str = "DOCS_QA_BASE_URL";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_QUESTION_LENGTH: usize = 2000;
/// Freshness window for the cached service catalog.
pub const DEFAULT_SERVICE_CACHE_TTL_SECS: u64 = 300;

fn default_client_masked_entities() -> Vec<String> {
    vec!["NRIC".to_string()]
}

fn default_suggested_questions() -> Vec<String> {
    [
        "How do I deploy a model?",
        "How does the orchestration service work?",
        "Which products support the assistant as a copilot?",
        "How do I store and query vector embeddings?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend base URL; the `DOCS_QA_BASE_URL` environment variable wins
    /// over this value.
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_question_length: Option<usize>,
    /// Ask the backend to include pipeline step labels with each answer.
    pub show_pipeline: Option<bool>,
    /// Entity types the client masks itself instead of the backend.
    pub client_masked_entities: Option<Vec<String>>,
    /// Starter questions offered while a conversation is empty.
    pub suggested_questions: Option<Vec<String>>,
    /// Fallback service display names for when the catalog is unavailable.
    #[serde(default)]
    pub service_names: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: config_path.to_path_buf(),
                source,
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(&Self::config_path())
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "askdocs")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Effective base URL: environment override, then config, then default.
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var(BASE_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                return url;
            }
        }
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn max_question_length(&self) -> usize {
        self.max_question_length
            .unwrap_or(DEFAULT_MAX_QUESTION_LENGTH)
    }

    pub fn show_pipeline(&self) -> bool {
        self.show_pipeline.unwrap_or(false)
    }

    pub fn suggested_questions(&self) -> Vec<String> {
        self.suggested_questions
            .clone()
            .unwrap_or_else(default_suggested_questions)
    }

    pub fn service_cache_ttl(&self) -> Duration {
        Duration::from_secs(DEFAULT_SERVICE_CACHE_TTL_SECS)
    }

    pub fn masking_policy(&self) -> MaskingPolicy {
        let types = self
            .client_masked_entities
            .clone()
            .unwrap_or_else(default_client_masked_entities);
        MaskingPolicy::new(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let config =
            Config::load_from_path(&dir.path().join("missing.toml")).expect("load ok");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_question_length(), 2000);
        assert!(!config.show_pipeline());
        assert_eq!(config.suggested_questions().len(), 4);
        assert!(config.masking_policy().is_client_masked("NRIC"));
        assert!(!config.masking_policy().is_client_masked("EMAIL"));
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("config.toml");
        let config = Config {
            base_url: Some("http://docs-qa.internal:9000".to_string()),
            request_timeout_secs: Some(10),
            max_question_length: Some(500),
            show_pipeline: Some(true),
            client_masked_entities: Some(vec!["NRIC".to_string(), "FIN".to_string()]),
            suggested_questions: Some(vec!["What is the vector engine?".to_string()]),
            service_names: HashMap::from([("ai-core".to_string(), "AI Core".to_string())]),
        };
        config.save_to_path(&path).expect("save ok");

        let loaded = Config::load_from_path(&path).expect("load ok");
        assert_eq!(loaded.base_url.as_deref(), Some("http://docs-qa.internal:9000"));
        assert_eq!(loaded.request_timeout(), Duration::from_secs(10));
        assert_eq!(loaded.max_question_length(), 500);
        assert!(loaded.show_pipeline());
        assert!(loaded.masking_policy().is_client_masked("FIN"));
        assert_eq!(loaded.suggested_questions().len(), 1);
        assert_eq!(
            loaded.service_names.get("ai-core").map(String::as_str),
            Some("AI Core")
        );
    }

    #[test]
    fn invalid_toml_reports_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [not toml").expect("write ok");
        let err = Config::load_from_path(&path).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn environment_variable_overrides_configured_base_url() {
        let config = Config {
            base_url: Some("http://from-config:8000".to_string()),
            ..Config::default()
        };
        assert_eq!(config.base_url(), "http://from-config:8000");

        env::set_var(BASE_URL_ENV_VAR, "http://from-env:8000");
        assert_eq!(config.base_url(), "http://from-env:8000");
        env::remove_var(BASE_URL_ENV_VAR);

        assert_eq!(Config::default().base_url(), DEFAULT_BASE_URL);
    }
}
