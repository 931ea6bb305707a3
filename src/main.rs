use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;

use user_registry::{
    auth::TokenService,
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    routes::app,
    services::ServiceContext,
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
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging);

    let db_cfg = cfg
        .database
        .as_ref()
        .context("database config is required (APP_DATABASE__URL)")?;
    let auth_cfg = cfg
        .auth
        .clone()
        .context("auth config is required (APP_AUTH__JWT_SECRET, APP_AUTH__ADMIN_EMAIL, ...)")?;

    let db = connection::connect(db_cfg).await?;
    let tokens = TokenService::from_config(&auth_cfg);
    ServiceContext::new(&db, tokens.clone())
        .user()
        .seed_admin(&auth_cfg)
        .await?;

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;
    let state = AppState::new(cfg, db, tokens);
    let router = app(Arc::clone(&state));

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
