use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasklist::api::router;
use tasklist::config::AppConfig;
use tasklist::db;
use tasklist::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tasklist=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database).await?;
    if let Err(e) = db::initialize(&pool).await {
        error!("failed to initialize database: {}", e);
        return Err(e.into());
    }

    let state = AppState::new(pool);
    let app = router(state);

    let addr = config.listen_addr()?;
    info!("listening on http://{}", addr);
    info!("health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
