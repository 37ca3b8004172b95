use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionRegistry>,
    pub http_client: reqwest::Client,
    pub clone_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.sessions_dir())?;

        let max_concurrent_clones = config.max_concurrent_clones;

        Ok(Self {
            config,
            sessions: Arc::new(SessionRegistry::new()),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            clone_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent_clones)),
        })
    }
}
