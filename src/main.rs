use sponsorhub::{catalog, config::Config, db, local_store::LocalStore, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sponsorhub=info,tower_http=debug")),
        )
        .init();

    let config = Config::load()?;

    let pool = db::connect(&config.database_url, 5).await?;
    db::migrate(&pool).await?;

    if config.seed_demo {
        if let Err(e) = catalog::seed_if_empty(&pool).await {
            tracing::warn!(error = %e, "could not seed demo events");
        }
    }

    let local = LocalStore::new(&config.local_store_path);
    let app = sponsorhub::app(AppState::new(pool, local), &config.assets_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
