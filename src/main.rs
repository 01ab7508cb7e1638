use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use dormcart::{
    auth::AuthState,
    config::AppConfig,
    db::{connection, seed},
    logging::{init_tracing, startup_log_level},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let loaded = AppConfig::from_env();
    init_tracing(startup_log_level(loaded.as_ref().ok()));
    let cfg = loaded.context("failed to load config")?;

    let auth = AuthState::from_config(cfg.require_auth()?);

    let db = connection::connect(&cfg.database).await?;
    for (name, outcome) in seed::seed_defaults(&db, &cfg.seed)
        .await
        .context("seeding failed")?
    {
        tracing::info!(seed = name, ?outcome, "seed checked");
    }

    let state = AppState::new(cfg, db, auth);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", state.config.general.host, state.config.general.port)
        .parse()
        .context("invalid host/port")?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
