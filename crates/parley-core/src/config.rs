use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley gateway.
///
/// Loaded from `./parley.toml` by default (override with `PARLEY_CONFIG`).
/// Each section corresponds to one bounded context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Port the HTTP/WebSocket server binds on (localhost only).
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 3100,
            log_level: "info".to_string(),
        }
    }
}

/// Guard-rail thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Minimum message length in characters.
    pub min_message_len: usize,
    /// Maximum message length in characters.
    pub max_message_len: usize,
    /// A single word repeated more than this many times marks the message
    /// as excessively repetitive.
    pub max_repeated_word: usize,
    /// Requests allowed per identity inside the rate window.
    pub rate_max_requests: usize,
    /// Sliding rate-window length in seconds.
    pub rate_window_secs: u64,
    /// Topics the gateway declines to discuss (case-folded substring match).
    pub out_of_scope_topics: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_message_len: 2,
            max_message_len: 1000,
            max_repeated_word: 10,
            rate_max_requests: 15,
            rate_window_secs: 60,
            out_of_scope_topics: vec![
                "weather".to_string(),
                "sports".to_string(),
                "politics".to_string(),
                "celebrity".to_string(),
                "horoscope".to_string(),
                "tell me a joke".to_string(),
            ],
        }
    }
}

/// Retrieval filtering policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum acceptable distance for a snippet to count as relevant.
    pub distance_threshold: f64,
    /// Candidates requested from the search collaborator.
    pub max_candidates: usize,
    /// Snippets kept after filtering.
    pub top_k: usize,
    /// FAQ corpus file loaded into the default in-memory index.
    pub corpus_file: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.35,
            max_candidates: 5,
            top_k: 2,
            corpus_file: "data/faqs.txt".to_string(),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Transcript is bounded to this many user/bot pairs.
    pub context_pairs: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { context_pairs: 5 }
    }
}

/// Idle-connection nudge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Seconds of inactivity before a connection is due a nudge.
    pub idle_threshold_secs: u64,
    /// Seconds between background sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            idle_threshold_secs: 30,
            sweep_interval_secs: 10,
        }
    }
}

/// Generation backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Model name passed through to the service.
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3:latest".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.general.port, 3100);
        assert_eq!(config.guard.min_message_len, 2);
        assert_eq!(config.guard.max_message_len, 1000);
        assert_eq!(config.guard.rate_max_requests, 15);
        assert_eq!(config.guard.rate_window_secs, 60);
        assert!((config.retrieval.distance_threshold - 0.35).abs() < f64::EPSILON);
        assert_eq!(config.retrieval.max_candidates, 5);
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.chat.context_pairs, 5);
        assert_eq!(config.liveness.idle_threshold_secs, 30);
        assert_eq!(config.liveness.sweep_interval_secs, 10);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = ParleyConfig::load_or_default(Path::new("/nonexistent/parley.toml"));
        assert_eq!(config.general.port, 3100);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let toml_str = r#"
            [general]
            port = 4000

            [guard]
            rate_max_requests = 3
        "#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.port, 4000);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.guard.rate_max_requests, 3);
        assert_eq!(config.guard.max_message_len, 1000);
        assert_eq!(config.retrieval.top_k, 2);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");

        let mut config = ParleyConfig::default();
        config.general.port = 5151;
        config.liveness.idle_threshold_secs = 7;
        config.save(&path).unwrap();

        let reloaded = ParleyConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, 5151);
        assert_eq!(reloaded.liveness.idle_threshold_secs, 7);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "this is not = [valid").unwrap();
        assert!(ParleyConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_on_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "this is not = [valid").unwrap();
        let config = ParleyConfig::load_or_default(&path);
        assert_eq!(config.general.port, 3100);
    }
}
