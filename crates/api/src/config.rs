use anyhow::{Context, Result};
use extract::{PipelineConfig, ReconcileOrder, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: OperationMode,
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub parser: ParserConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Fast,      // Cache aggressively, skip event augmentation
    Accurate,  // Always fresh, long timeouts
    Balanced,  // Default: cache when available, both augmentation stages
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub output_dir: PathBuf,
    pub log_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// `None` disables augmentation.
    pub base_url: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// `None` means requests must carry their own parse.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_backoff_ms, self.max_backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            output_dir: PathBuf::from("data/events"),
            log_json: false,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: Some("http://localhost:11434".to_string()),
            model: "llama3".to_string(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: Some("http://localhost:8001".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Balanced,
            server: ServerConfig::default(),
            ollama: OllamaConfig::default(),
            parser: ParserConfig::default(),
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn fast_mode() -> Self {
        Self {
            mode: OperationMode::Fast,
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 500,
                max_backoff_ms: 5000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 50000,
            },
            pipeline: PipelineConfig {
                order: ReconcileOrder::EntitiesFirst,
                augment_entities: true,
                augment_events: false,
                augment_timeout_secs: 30,
            },
            ..Self::default()
        }
    }

    pub fn accurate_mode() -> Self {
        Self {
            mode: OperationMode::Accurate,
            retry: RetryConfig {
                max_retries: 5,
                initial_backoff_ms: 2000,
                max_backoff_ms: 20000,
            },
            cache: CacheConfig {
                enabled: false,
                max_entries: 0,
            },
            pipeline: PipelineConfig {
                augment_timeout_secs: 120,
                ..PipelineConfig::default()
            },
            ..Self::default()
        }
    }

    /// No collaborators: every request must carry its parse, nothing is
    /// augmented.
    pub fn offline() -> Self {
        Self {
            ollama: OllamaConfig {
                base_url: None,
                ..OllamaConfig::default()
            },
            parser: ParserConfig { base_url: None },
            ..Self::default()
        }
    }

    pub fn for_mode(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Fast => Self::fast_mode(),
            OperationMode::Accurate => Self::accurate_mode(),
            OperationMode::Balanced => Self::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `EVENTS_MODE` (fast, accurate, balanced) picks the preset; the others
    /// override single fields:
    /// - `EVENTS_BIND_ADDR`
    /// - `EVENTS_OUTPUT_DIR`
    /// - `EVENTS_LOG_JSON` -- `true` for JSON log lines
    /// - `EVENTS_OLLAMA_URL` -- empty disables augmentation
    /// - `EVENTS_OLLAMA_MODEL`
    /// - `EVENTS_PARSER_URL` -- empty disables the parser service
    /// - `EVENTS_AUGMENT_TIMEOUT_SECS`
    /// - `EVENTS_RECONCILE_ORDER` -- entities_first or events_first
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = match lookup("EVENTS_MODE") {
            Some(raw) => parse_mode(&raw)?,
            None => OperationMode::Balanced,
        };
        let mut config = Self::for_mode(mode);

        if let Some(addr) = lookup("EVENTS_BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(dir) = lookup("EVENTS_OUTPUT_DIR") {
            config.server.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("EVENTS_LOG_JSON") {
            config.server.log_json = raw
                .parse()
                .with_context(|| format!("invalid EVENTS_LOG_JSON: {raw}"))?;
        }
        if let Some(url) = lookup("EVENTS_OLLAMA_URL") {
            config.ollama.base_url = non_empty(url);
        }
        if let Some(model) = lookup("EVENTS_OLLAMA_MODEL") {
            config.ollama.model = model;
        }
        if let Some(url) = lookup("EVENTS_PARSER_URL") {
            config.parser.base_url = non_empty(url);
        }
        if let Some(raw) = lookup("EVENTS_AUGMENT_TIMEOUT_SECS") {
            config.pipeline.augment_timeout_secs = raw
                .parse()
                .with_context(|| format!("invalid EVENTS_AUGMENT_TIMEOUT_SECS: {raw}"))?;
        }
        if let Some(raw) = lookup("EVENTS_RECONCILE_ORDER") {
            config.pipeline.order = match raw.trim() {
                "entities_first" => ReconcileOrder::EntitiesFirst,
                "events_first" => ReconcileOrder::EventsFirst,
                other => anyhow::bail!("invalid EVENTS_RECONCILE_ORDER: {other}"),
            };
        }

        Ok(config)
    }
}

fn parse_mode(raw: &str) -> Result<OperationMode> {
    match raw.trim().to_lowercase().as_str() {
        "fast" => Ok(OperationMode::Fast),
        "accurate" => Ok(OperationMode::Accurate),
        "balanced" => Ok(OperationMode::Balanced),
        other => anyhow::bail!("invalid EVENTS_MODE: {other}"),
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().trim_end_matches('/').to_string();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = load(&[]).unwrap();
        assert_eq!(config.mode, OperationMode::Balanced);
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.pipeline.augment_timeout_secs, 60);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_mode_preset_then_overrides() {
        let config = load(&[
            ("EVENTS_MODE", "Fast"),
            ("EVENTS_AUGMENT_TIMEOUT_SECS", "5"),
            ("EVENTS_OLLAMA_URL", "http://gpu-box:11434/"),
            ("EVENTS_PARSER_URL", ""),
            ("EVENTS_RECONCILE_ORDER", "events_first"),
        ])
        .unwrap();

        assert_eq!(config.mode, OperationMode::Fast);
        assert!(!config.pipeline.augment_events);
        assert_eq!(config.pipeline.augment_timeout_secs, 5);
        assert_eq!(config.pipeline.order, ReconcileOrder::EventsFirst);
        assert_eq!(config.ollama.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.parser.base_url, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[("EVENTS_MODE", "turbo")]).is_err());
        assert!(load(&[("EVENTS_AUGMENT_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("EVENTS_LOG_JSON", "yes")]).is_err());
    }

    #[test]
    fn test_accurate_mode_disables_cache() {
        let config = AppConfig::for_mode(OperationMode::Accurate);
        assert!(!config.cache.enabled);
        assert_eq!(config.retry.policy().max_retries(), 5);
    }
}
