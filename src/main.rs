use anyhow::Context;
use axum::Router;
use palaver::realtime::ConnectionRegistry;
use palaver::{AppState, auth, chats, db, messages, realtime};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url = dotenv::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db_pool = db::connect(&database_url).await?;
    db::init_schema(&db_pool).await?;
    info!("database initialized");

    let app_state = AppState {
        db_pool,
        registry: ConnectionRegistry::new(),
    };

    let app = Router::new()
        .merge(auth::router())
        .merge(chats::router())
        .merge(messages::router())
        .merge(realtime::router())
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
