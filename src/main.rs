use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Datelike;
use tracing_subscriber::EnvFilter;

use walkbook::config::AppConfig;
use walkbook::db;
use walkbook::services::holiday_source::FeiertageSource;
use walkbook::services::holidays;
use walkbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    tracing::info!("using holiday API at {}", config.holiday_api_url);
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        holiday_source: Box::new(FeiertageSource::new(config.holiday_api_url.clone())),
    });

    spawn_holiday_refresh(Arc::clone(&state));

    let app = walkbook::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Keeps the official holidays for this year and next warm in the background.
fn spawn_holiday_refresh(state: Arc<AppState>) {
    let every = Duration::from_secs(state.config.holiday_refresh_interval_hours.max(1) * 3600);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let now = chrono::Local::now().naive_local();
            for year in [now.year(), now.year() + 1] {
                let outcome = holidays::refresh_official_holidays(&state, year, now).await;
                tracing::debug!(year, ?outcome, "background holiday refresh");
            }
        }
    });
}
