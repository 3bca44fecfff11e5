//! Runtime configuration: model choice and region-keyword policy.

use crate::llm::DEFAULT_MODEL;
use crate::pipeline::DEFAULT_REGION_KEYWORDS;
use crate::types::{AskError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default model name. `ASKDB_MODEL` in the environment wins over this.
    #[serde(default)]
    pub model: Option<String>,

    /// Question terms that trigger the region-handling explanation.
    #[serde(default = "default_region_keywords")]
    pub region_keywords: Vec<String>,
}

fn default_region_keywords() -> Vec<String> {
    DEFAULT_REGION_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            region_keywords: default_region_keywords(),
        }
    }
}

impl Config {
    /// Get config directory (~/.askdb/).
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| AskError::Config("HOME not set".to_string()))?;
        let dir = PathBuf::from(home).join(".askdb");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Get config file path (~/.askdb/config.json).
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load configuration from file, defaults when absent.
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| AskError::Config(format!("Invalid config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_file = Self::config_file()?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AskError::Config(format!("Serialize error: {}", e)))?;
        fs::write(&config_file, content)?;
        Ok(())
    }

    /// Resolve the model name: environment override, then config, then default.
    pub fn resolve_model(&self) -> String {
        std::env::var("ASKDB_MODEL")
            .ok()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_keywords() {
        let config = Config::default();
        assert_eq!(
            config.region_keywords,
            vec!["region", "country", "us", "uk", "india"]
        );
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.model.is_none());
        assert!(!config.region_keywords.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.model = Some("gpt-4-turbo".to_string());
        config.region_keywords = vec!["country".to_string()];

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model.as_deref(), Some("gpt-4-turbo"));
        assert_eq!(back.region_keywords, vec!["country"]);
    }
}
