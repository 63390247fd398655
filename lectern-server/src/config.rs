//! Service configuration
//!
//! Sources are layered, later wins: defaults, then a TOML or YAML file, then
//! `LECTERN_*` environment variables, then command line flags (applied by the
//! binary).

use lectern_spk::{SpeechConfig, TtsEngine};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LecternConfig {
    pub instance: InstanceConfig,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Default filter when `RUST_LOG` is not set
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub bind_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding uploaded documents and the audio slots
    pub root: PathBuf,
    /// Keep uploaded documents after their text has been extracted
    pub keep_uploads: bool,
    pub max_upload_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            keep_uploads: true,
            max_upload_mb: 16,
        }
    }
}

impl StorageConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl LecternConfig {
    /// Load configuration from a TOML or YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ConfigError::Io(format!("Path traversal detected: '{}'", path.display())));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            _ => Self::from_str(&content),
        }
    }

    /// Parse configuration of unknown format, trying TOML then YAML.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = toml::from_str::<LecternConfig>(content) {
            return Ok(config);
        }

        serde_yaml::from_str::<LecternConfig>(content)
            .map_err(|_| ConfigError::Parse("Unknown format (expected TOML or YAML)".to_string()))
    }

    /// Overlay `LECTERN_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay `LECTERN_*` variables read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LECTERN_HOST") {
            self.network.bind_address = host;
        }

        if let Some(port) = lookup("LECTERN_PORT") {
            self.network.bind_port = port
                .parse()
                .map_err(|_| ConfigError::Parse(format!("LECTERN_PORT is not a port number: '{}'", port)))?;
        }

        if let Some(root) = lookup("LECTERN_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }

        if let Some(level) = lookup("LECTERN_LOG_LEVEL") {
            self.instance.log_level = level;
        }

        if let Some(engine) = lookup("LECTERN_TTS_ENGINE") {
            self.speech.engine = engine.parse::<TtsEngine>().map_err(ConfigError::Parse)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation("network.bind_address cannot be empty".to_string()));
        }

        if self.network.bind_port == 0 {
            return Err(ConfigError::Validation("network.bind_port cannot be 0".to_string()));
        }

        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("storage.root cannot be empty".to_string()));
        }

        if self.storage.max_upload_mb == 0 || self.storage.max_upload_mb > 1024 {
            return Err(ConfigError::Validation(
                "storage.max_upload_mb must be between 1 and 1024".to_string(),
            ));
        }

        if self.instance.log_level.trim().is_empty() {
            return Err(ConfigError::Validation("instance.log_level cannot be empty".to_string()));
        }

        self.speech
            .validate()
            .map_err(|e| ConfigError::Validation(format!("speech: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LecternConfig::default();
        assert_eq!(config.network.bind_address, "127.0.0.1");
        assert_eq!(config.network.bind_port, 5000);
        assert_eq!(config.storage.root, PathBuf::from("uploads"));
        assert!(config.storage.keep_uploads);
        assert_eq!(config.storage.max_upload_bytes(), 16 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = LecternConfig::from_str(
            r#"
            [network]
            bind_port = 8080

            [speech]
            engine = "openai"
            "#,
        )
        .unwrap();
        assert_eq!(config.network.bind_port, 8080);
        assert_eq!(config.network.bind_address, "127.0.0.1");
        assert_eq!(config.speech.engine, TtsEngine::OpenAi);
    }

    #[test]
    fn test_yaml() {
        let config = LecternConfig::from_str("storage:\n  root: /var/lib/lectern\n  keep_uploads: false\n").unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/var/lib/lectern"));
        assert!(!config.storage.keep_uploads);
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lectern.toml");
        std::fs::write(&path, "[instance]\nlog_level = \"debug\"\n").unwrap();

        let config = LecternConfig::from_file(&path).unwrap();
        assert_eq!(config.instance.log_level, "debug");
    }

    #[test]
    fn test_from_file_rejects_traversal() {
        let result = LecternConfig::from_file("config/../../etc/lectern.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("LECTERN_HOST", "0.0.0.0"),
            ("LECTERN_PORT", "9000"),
            ("LECTERN_STORAGE_ROOT", "/tmp/audio"),
            ("LECTERN_TTS_ENGINE", "openai"),
        ]
        .into_iter()
        .collect();

        let mut config = LecternConfig::default();
        config
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.network.bind_port, 9000);
        assert_eq!(config.storage.root, PathBuf::from("/tmp/audio"));
        assert_eq!(config.speech.engine, TtsEngine::OpenAi);
        assert_eq!(config.instance.log_level, "info");
    }

    #[test]
    fn test_env_overlay_rejects_bad_port() {
        let mut config = LecternConfig::default();
        let result = config.apply_env_from(|key| (key == "LECTERN_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = LecternConfig::default();
        config.network.bind_port = 0;
        assert!(config.validate().is_err());

        let mut config = LecternConfig::default();
        config.storage.max_upload_mb = 0;
        assert!(config.validate().is_err());

        let mut config = LecternConfig::default();
        config.speech.volume = 3.0;
        assert!(config.validate().is_err());
    }
}
