//! Server binary: load config, prepare the database, serve the API.

use figurine_shop::{app, ensure_database_exists, ensure_tables, seed, AppConfig, AppState};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let default_filter = if config.is_local() {
        "figurine_shop=debug,tower_http=debug,sqlx=debug"
    } else {
        "figurine_shop=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    ensure_tables(&pool).await?;
    seed(
        &pool,
        config
            .seed_admin
            .as_ref()
            .map(|(email, password)| (email.as_str(), password.as_str())),
    )
    .await?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    let address = format!("0.0.0.0:{}", config.port);
    let public_url = config.url.clone();
    let state = AppState::new(pool, config);

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(%address, url = %public_url, "server listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
