use crate::core::listen_format::RecordFormat;
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOURCE_ENDPOINT: &str = "https://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_DESTINATION_ENDPOINT: &str = "https://api.listenbrainz.org/1/submit-listens";

/// Largest page the source history endpoint will serve.
pub const MAX_PAGE_SIZE: u32 = 200;

pub const API_KEY_ENV: &str = "LASTFM_API_KEY";
pub const TOKEN_ENV: &str = "LISTENBRAINZ_TOKEN";

/// Everything a migration run needs, built once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOURCE_ENDPOINT.to_string(),
            api_key: String::new(),
            page_size: MAX_PAGE_SIZE,
            timeout_seconds: 30,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub endpoint: String,
    pub token: String,
    pub record_format: RecordFormat,
    pub timeout_seconds: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DESTINATION_ENDPOINT.to_string(),
            token: String::new(),
            record_format: RecordFormat::default(),
            timeout_seconds: 30,
        }
    }
}

impl DestinationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Records per submission.
    pub batch_size: usize,
    /// Pause between consecutive submissions.
    pub batch_delay_ms: u64,
    pub max_concurrent_fetches: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 1000,
            max_concurrent_fetches: 8,
        }
    }
}

impl PipelineSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MigrateError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MigrateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Load `path` if it exists, otherwise start from defaults, then fill
    /// empty credentials from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::debug!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${LASTFM_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MigrateError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn apply_env_overrides(&mut self) {
        if self.source.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.source.api_key = key;
            }
        }
        if self.destination.token.trim().is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV) {
                self.destination.token = token;
            }
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_credential("source.api_key", &self.source.api_key)?;
        validation::validate_range("source.page_size", self.source.page_size, 1, MAX_PAGE_SIZE)?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds as usize,
            1,
        )?;

        validation::validate_url("destination.endpoint", &self.destination.endpoint)?;
        validation::validate_credential("destination.token", &self.destination.token)?;
        validation::validate_positive_number(
            "destination.timeout_seconds",
            self.destination.timeout_seconds as usize,
            1,
        )?;

        validation::validate_positive_number("pipeline.batch_size", self.pipeline.batch_size, 1)?;
        validation::validate_positive_number(
            "pipeline.max_concurrent_fetches",
            self.pipeline.max_concurrent_fetches,
            1,
        )?;

        Ok(())
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Which history to migrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub user: String,
    pub total_pages: u32,
}

impl MigrationRequest {
    pub fn new(user: impl Into<String>, total_pages: u32) -> Self {
        Self {
            user: user.into(),
            total_pages,
        }
    }
}

impl Validate for MigrationRequest {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("username", &self.user)?;
        validation::validate_positive_number("total_pages", self.total_pages as usize, 1)
    }
}
