use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mockbq_api::{router, AppState};
use mockbq_core::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool = open_database(&settings).await;
    let app = router(AppState::new(pool));

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// A database that cannot be opened or migrated leaves the API up in degraded mode.
async fn open_database(settings: &Settings) -> Option<SqlitePool> {
    let pool = match mockbq_core::storage::connect(&settings.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "db open failed; starting API in degraded mode");
            return None;
        }
    };

    match mockbq_core::storage::migrate(&pool).await {
        Ok(()) => {
            tracing::info!(database_url = %settings.database_url, "database ready");
            Some(pool)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "db migrations failed; starting API in degraded mode");
            None
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
