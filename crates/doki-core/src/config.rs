use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DokiError, Result};
use crate::types::GenerationParams;

/// Top-level configuration for the Doki service.
///
/// Loaded from `~/.doki/config.toml` by default. API keys are never stored
/// here; each backend section names the environment variable to read instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DokiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl DokiConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DokiConfig = toml::from_str(&content)?;
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
            toml::to_string_pretty(self).map_err(|e| DokiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the API binds to.
    pub host: String,
    /// HTTP port the API binds to.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.doki/data".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3040,
        }
    }
}

/// Which conversation store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Conversation persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file name, relative to `general.data_dir`.
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_file: "doki.db".to_string(),
        }
    }
}

/// Limits applied to conversations and incoming messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Most recent turns rendered into the prompt. Stored history is not
    /// affected.
    pub max_history_turns: usize,
    /// Maximum accepted length of a user message in characters.
    pub max_message_chars: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 20,
            max_message_chars: 4000,
        }
    }
}

/// Assistant persona used in the prompt preamble.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Name the assistant introduces itself with.
    pub name: String,
    /// Label prefixed to assistant lines and used as the trailing cue.
    pub assistant_label: String,
    /// Knowledge cutoff stated in the preamble.
    pub knowledge_cutoff: String,
    /// Substring in the user's message that triggers a web search.
    pub search_keyword: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "DokiAI".to_string(),
            assistant_label: "Assistant".to_string(),
            knowledge_cutoff: "September 2021".to_string(),
            search_keyword: "search".to_string(),
        }
    }
}

/// What to do when the generation backend answers with zero candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCandidatePolicy {
    /// Fail the request with an internal error and persist nothing.
    #[default]
    Fail,
    /// Continue with an empty generated text.
    Continue,
}

/// Text-generation backend (OpenAI-compatible completions API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub n: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
    pub on_empty_candidates: EmptyCandidatePolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: params.max_tokens,
            n: params.n,
            temperature: params.temperature,
            top_p: params.top_p,
            timeout_secs: 60,
            on_empty_candidates: EmptyCandidatePolicy::Fail,
        }
    }
}

impl GenerationConfig {
    /// Sampling parameters sent with every completion request.
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            n: self.n,
            stop: None,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }
}

/// Image-labeling backend (Google Cloud Vision).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key_env: "GOOGLE_VISION_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Web-search backend (Google Custom Search JSON API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key_env: String,
    /// Environment variable holding the custom search engine id (`cx`).
    pub engine_id_env: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com".to_string(),
            api_key_env: "GOOGLE_SEARCH_API_KEY".to_string(),
            engine_id_env: "GOOGLE_SEARCH_ENGINE_ID".to_string(),
            timeout_secs: 15,
        }
    }
}

/// HTTP surface limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Maximum request body size. Images arrive inline as base64.
    pub max_body_bytes: usize,
    /// Requests per second across all clients.
    pub rate_limit_per_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
            rate_limit_per_sec: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = DokiConfig::default();
        assert_eq!(config.general.data_dir, "~/.doki/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.host, "127.0.0.1");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.database_file, "doki.db");
        assert_eq!(config.conversation.max_history_turns, 20);
        assert_eq!(config.persona.search_keyword, "search");
        assert_eq!(config.generation.max_tokens, 150);
        assert_eq!(config.generation.n, 1);
        assert_eq!(
            config.generation.on_empty_candidates,
            EmptyCandidatePolicy::Fail
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "debug"

[conversation]
max_history_turns = 6

[generation]
on_empty_candidates = "continue"
"#;
        let file = create_temp_config(content);
        let config = DokiConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.conversation.max_history_turns, 6);
        assert_eq!(config.conversation.max_message_chars, 4000);
        assert_eq!(
            config.generation.on_empty_candidates,
            EmptyCandidatePolicy::Continue
        );
        assert_eq!(config.generation.model, "gpt-3.5-turbo-instruct");
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[general]
data_dir = "/var/lib/doki"
log_level = "warn"
host = "0.0.0.0"
port = 8080

[storage]
backend = "memory"
database_file = "chat.db"

[persona]
name = "Doki"
assistant_label = "Doki"
knowledge_cutoff = "June 2024"
search_keyword = "lookup"

[generation]
base_url = "http://localhost:11434"
model = "llama3"
api_key_env = "LOCAL_KEY"
max_tokens = 256
n = 1
temperature = 0.2
top_p = 0.9
timeout_secs = 10

[vision]
endpoint = "http://vision.local"
api_key_env = "VISION_KEY"
timeout_secs = 5

[search]
endpoint = "http://search.local"
api_key_env = "SEARCH_KEY"
engine_id_env = "SEARCH_CX"
timeout_secs = 3

[api]
max_body_bytes = 2048
rate_limit_per_sec = 5
"#;
        let file = create_temp_config(content);
        let config = DokiConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/var/lib/doki");
        assert_eq!(config.general.host, "0.0.0.0");
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.database_file, "chat.db");
        assert_eq!(config.persona.assistant_label, "Doki");
        assert_eq!(config.persona.search_keyword, "lookup");
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.generation.max_tokens, 256);
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.vision.endpoint, "http://vision.local");
        assert_eq!(config.search.engine_id_env, "SEARCH_CX");
        assert_eq!(config.api.max_body_bytes, 2048);
        assert_eq!(config.api.rate_limit_per_sec, 5);
    }

    #[test]
    fn test_generation_params_follow_config() {
        let config = GenerationConfig {
            max_tokens: 64,
            temperature: 0.9,
            ..GenerationConfig::default()
        };
        let params = config.params();
        assert_eq!(params.max_tokens, 64);
        assert_eq!(params.n, 1);
        assert!(params.stop.is_none());
        assert!((params.temperature - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = DokiConfig::load_or_default(Path::new("/nonexistent/doki/config.toml"));
        assert_eq!(config.general.data_dir, "~/.doki/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = DokiConfig::load(file.path());
        assert!(matches!(result, Err(DokiError::Config(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DokiConfig::default();
        config.conversation.max_history_turns = 8;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = DokiConfig::load(&path).unwrap();
        assert_eq!(reloaded.conversation.max_history_turns, 8);
        assert_eq!(reloaded.persona.name, "DokiAI");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = DokiConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.api.rate_limit_per_sec, 50);
    }
}
