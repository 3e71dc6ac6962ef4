use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const DEFAULT_MAX_DURATION_SECS: u64 = 30;

pub const BASE_URL_ENV: &str = "VOCAB_READER_BASE_URL";
pub const MODEL_ENV: &str = "VOCAB_READER_MODEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything the streaming relay needs to reach the completion endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Explicit credential. When absent, `api_key_env` is read at call time.
    pub api_key: Option<String>,
    pub api_key_env: String,
    /// Total request budget in seconds; `0` disables the client timeout.
    /// Defaults to 30 when the key is absent.
    pub max_duration_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_duration_secs: Some(DEFAULT_MAX_DURATION_SECS),
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            return Some(key.to_string());
        }
        env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSection {
    pub user_id: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self { user_id: 1 }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Log,
    Jsonl,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Log,
            path: PathBuf::from("saved_passages.jsonl"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub app: AppSection,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "llm.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "llm.model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.store.kind == StoreKind::Jsonl && self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.path",
                reason: "required when store.kind = \"jsonl\"".to_string(),
            });
        }
        Ok(())
    }

    /// Applies `VOCAB_READER_BASE_URL` / `VOCAB_READER_MODEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(BASE_URL_ENV) {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                log::debug!("Using base URL from {}: {}", BASE_URL_ENV, trimmed);
                self.llm.base_url = trimmed.to_string();
            }
        }
        if let Ok(model) = env::var(MODEL_ENV) {
            let trimmed = model.trim();
            if !trimmed.is_empty() {
                log::debug!("Using model from {}: {}", MODEL_ENV, trimmed);
                self.llm.model = trimmed.to_string();
            }
        }
    }
}

/// Reads the TOML config. A missing file is not an error: defaults are used.
pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    match fs::read_to_string(file_path) {
        Ok(contents) => Config::from_toml_str(&contents, file_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found, using default configuration", file_path.display());
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: file_path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::from_toml_str(text, Path::new("config.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.max_duration_secs, Some(30));
        assert_eq!(config.app.user_id, 1);
        assert_eq!(config.store.kind, StoreKind::Log);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            [llm]
            model = "llama-3.1-8b-instant"

            [store]
            kind = "jsonl"
            path = "out/passages.jsonl"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.store.kind, StoreKind::Jsonl);
        assert_eq!(config.store.path, PathBuf::from("out/passages.jsonl"));
    }

    #[test]
    fn rejects_empty_model() {
        let err = parse("[llm]\nmodel = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "llm.model", .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(parse("[llm\nmodel="), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let llm = LlmConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn explicit_api_key_wins_over_env() {
        let llm = LlmConfig {
            api_key: Some("sk-explicit".to_string()),
            api_key_env: "VOCAB_READER_TEST_UNUSED_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_api_key().as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn api_key_is_read_from_env_at_call_time() {
        let llm = LlmConfig {
            api_key_env: "VOCAB_READER_TEST_KEY_AT_CALL_TIME".to_string(),
            ..LlmConfig::default()
        };
        env::remove_var("VOCAB_READER_TEST_KEY_AT_CALL_TIME");
        assert_eq!(llm.resolve_api_key(), None);

        env::set_var("VOCAB_READER_TEST_KEY_AT_CALL_TIME", " sk-later ");
        assert_eq!(llm.resolve_api_key().as_deref(), Some("sk-later"));
        env::remove_var("VOCAB_READER_TEST_KEY_AT_CALL_TIME");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_from_file(Path::new("definitely/not/here/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_overrides_replace_base_url_and_model() {
        let mut config = parse("[llm]\nbase_url = \"http://file\"\nmodel = \"file-model\"").unwrap();

        env::set_var(BASE_URL_ENV, " http://localhost:11434/v1 ");
        env::set_var(MODEL_ENV, "   ");
        config.apply_env_overrides();
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "file-model");

        env::set_var(MODEL_ENV, "llama3-70b-8192");
        config.apply_env_overrides();
        assert_eq!(config.llm.model, "llama3-70b-8192");

        env::remove_var(BASE_URL_ENV);
        env::remove_var(MODEL_ENV);
        config.apply_env_overrides();
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "llama3-70b-8192");
    }
}
