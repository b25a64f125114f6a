use recipehub::{app, categories, scheduler, state::AppState, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipehub=debug,axum=info,tower_http=info".to_string());
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

    let state = AppState::init().await?;

    let seeded = categories::services::seed_defaults(&state).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "starter categories seeded");
    }
    users::services::ensure_default_admin(&state).await?;

    let jobs = scheduler::spawn(state.clone());
    let router = app::build_app(state.clone());
    let result = app::serve(router, &state.config.host, state.config.port).await;

    for job in jobs {
        job.abort();
    }
    state.caches.clear();
    tracing::info!("caches cleared, bye");
    result
}
