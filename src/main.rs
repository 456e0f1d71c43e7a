use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinematch_api::{
    auth::AuthApiClient,
    config::Config,
    db::{create_pool, PostgresStore},
    routes::create_router,
    services::completion::ChatGatewayClient,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PostgresStore::new(pool));
    let identity = Arc::new(AuthApiClient::new(config.auth_api_url.clone()));
    let completions = Arc::new(ChatGatewayClient::new(
        config.completion_api_key.clone(),
        config.completion_api_url.clone(),
        config.completion_model.clone(),
    ));

    let state = AppState::new(store, identity, completions);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
