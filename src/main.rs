use std::time::Duration;

use foodorder::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "foodorder=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init()?;
    tracing::info!(
        data_api = %app_state.config.data_api.base_url,
        extras_payload = ?app_state.config.extras_payload,
        "data api configured"
    );

    let sessions = app_state.sessions.clone();
    let every = Duration::from_secs(app_state.config.sessions.prune_interval_secs.max(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let pruned = sessions.prune_expired();
            if pruned > 0 {
                tracing::info!(pruned, remaining = sessions.len(), "expired idle sessions");
            }
        }
    });

    app::serve(app::build_app(app_state)).await
}
