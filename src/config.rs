use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for per-session working areas
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Maximum concurrent clone operations
    pub max_concurrent_clones: usize,
    /// Clone timeout in seconds
    pub clone_timeout_secs: u64,
    /// Maximum repo size in MB (checked after clone)
    pub max_repo_size_mb: u64,
    /// Sessions idle longer than this are evicted by the background sweep
    pub session_idle_timeout_secs: u64,
    /// How often the background sweep runs
    pub sweep_interval_secs: u64,
    /// Number of chunks retrieved per query
    pub retrieval_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Expected embedding vector width; 0 accepts whatever the model returns
    pub embedding_dim: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            max_concurrent_clones: 2,
            clone_timeout_secs: 300,
            max_repo_size_mb: 500,
            session_idle_timeout_secs: 1800,
            sweep_interval_secs: 60,
            retrieval_top_k: 6,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("REPO_QA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("REPO_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_MAX_CONCURRENT_CLONES") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_clones = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_CLONE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.clone_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_MAX_REPO_SIZE_MB") {
            if let Ok(v) = val.parse() {
                config.max_repo_size_mb = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_SESSION_IDLE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.session_idle_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_SWEEP_INTERVAL_SECS") {
            if let Ok(v) = val.parse() {
                config.sweep_interval_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_RETRIEVAL_TOP_K") {
            if let Ok(v) = val.parse() {
                config.retrieval_top_k = v;
            }
        }

        config
    }

    /// Root for per-session working directories.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Working directory for one session's cloned tree.
    pub fn session_dir(&self, session_id: &uuid::Uuid) -> PathBuf {
        self.sessions_dir().join(session_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_session_dir_is_namespaced_by_id() {
        let config = Config::default();
        let id = Uuid::new_v4();
        let dir = config.session_dir(&id);
        assert!(dir.starts_with(config.sessions_dir()));
        assert!(dir.to_string_lossy().contains(&id.to_string()));
    }
}
