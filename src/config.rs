use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub holiday_api_url: String,
    pub holiday_fetch_timeout_secs: u64,
    pub holiday_refresh_interval_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "walkbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            holiday_api_url: env::var("HOLIDAY_API_URL")
                .unwrap_or_else(|_| "https://feiertage-api.de/api/".to_string()),
            holiday_fetch_timeout_secs: env::var("HOLIDAY_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            holiday_refresh_interval_hours: env::var("HOLIDAY_REFRESH_INTERVAL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
        }
    }
}
