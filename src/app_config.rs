use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::translation::BatchConfig;
use crate::upload::MIN_CHUNK_SIZE;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Upload config
    #[serde(default)]
    pub upload: UploadConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Upload manager configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadConfig {
    /// Base URL of the presigned-URL issuer API
    #[serde(default = "default_issuer_endpoint")]
    pub endpoint: String,

    /// Part size in bytes
    #[serde(default = "default_chunk_size_bytes")]
    pub chunk_size_bytes: usize,

    /// Maximum concurrent part transfers
    #[serde(default = "default_upload_concurrency")]
    pub concurrency: usize,

    /// Total attempts per part, including the first
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds between part retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Request timeout in seconds for issuer and part calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_issuer_endpoint(),
            chunk_size_bytes: default_chunk_size_bytes(),
            concurrency: default_upload_concurrency(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation backend and batching configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name (e.g., "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional, for self-hosted or compatible APIs)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per backend call, including the first
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds between backend retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Batch sizing
    #[serde(default)]
    pub batch: BatchSettings,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_translation_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch: BatchSettings::default(),
        }
    }
}

/// Batch sizing settings as stored in the config file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchSettings {
    /// Batch size while the backend is healthy
    #[serde(default = "default_initial_batch_size")]
    pub initial_size: usize,

    /// Smallest batch size before falling back
    #[serde(default = "default_min_batch_size")]
    pub min_size: usize,

    /// Consecutive successes required to restore the initial size
    #[serde(default = "default_required_successes")]
    pub required_successes: u32,

    /// Delay between settled batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            initial_size: default_initial_batch_size(),
            min_size: default_min_batch_size(),
            required_successes: default_required_successes(),
            retry_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl BatchSettings {
    /// Convert to the processor's batch config
    pub fn to_batch_config(&self) -> BatchConfig {
        BatchConfig {
            initial_size: self.initial_size,
            min_size: self.min_size,
            required_successes: self.required_successes,
            retry_delay_ms: self.retry_delay_ms,
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

fn default_issuer_endpoint() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_chunk_size_bytes() -> usize {
    MIN_CHUNK_SIZE
}

fn default_upload_concurrency() -> usize {
    3
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_translation_timeout_secs() -> u64 {
    120
}

fn default_initial_batch_size() -> usize {
    50
}

fn default_min_batch_size() -> usize {
    1
}

fn default_required_successes() -> u32 {
    3
}

fn default_batch_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            upload: UploadConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!(
                "Failed to open config file {:?}: {}",
                path.as_ref(),
                e
            )
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_language_code(&self.source_language)?;
        validate_language_code(&self.target_language)?;

        if self.upload.chunk_size_bytes < MIN_CHUNK_SIZE {
            return Err(anyhow!(
                "chunk size must be at least {} bytes, got {}",
                MIN_CHUNK_SIZE,
                self.upload.chunk_size_bytes
            ));
        }
        if self.upload.concurrency < 1 {
            return Err(anyhow!("upload concurrency must be at least 1"));
        }
        if self.upload.retry_count < 1 {
            return Err(anyhow!("upload retry count must be at least 1"));
        }
        if self.upload.endpoint.is_empty() {
            return Err(anyhow!("issuer endpoint must not be empty"));
        }

        self.translation.batch.to_batch_config().validate()?;

        Ok(())
    }
}

/// Check a language code against ISO 639-1/639-3
fn validate_language_code(code: &str) -> Result<()> {
    let known = match code.len() {
        2 => isolang::Language::from_639_1(&code.to_lowercase()).is_some(),
        3 => isolang::Language::from_639_3(&code.to_lowercase()).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}
