use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use repo_qa::api;
use repo_qa::config::Config;
use repo_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;

    spawn_expiry_sweep(state.clone());

    let app = Router::new()
        .route("/status", get(api::status))
        .route("/clone", post(api::sessions::clone_session))
        .route("/query", post(api::query::query))
        .route("/remove", post(api::sessions::remove_session))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically evict idle sessions so working areas and indexes cannot
/// accumulate without bound. One session's cleanup failure is logged and
/// never blocks the rest of the sweep.
fn spawn_expiry_sweep(state: AppState) {
    let interval = std::time::Duration::from_secs(state.config.sweep_interval_secs);
    let idle_timeout = chrono::Duration::seconds(state.config.session_idle_timeout_secs as i64);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = state.sessions.expire_stale(chrono::Utc::now(), idle_timeout);
            for (session_id, dir) in evicted {
                tracing::info!("Session {session_id} expired after inactivity");
                api::sessions::cleanup_work_dir(session_id, dir).await;
            }
        }
    });
}
