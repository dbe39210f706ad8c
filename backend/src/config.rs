use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub admin_api_key: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub notification_api_url: Option<String>,
    pub notification_api_key: Option<String>,
    /// Pending orders older than this many hours are swept to cancelled.
    pub abandoned_sweep_hours: i64,
    pub abandoned_sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("max_db_connections", 20)?
            .set_default("abandoned_sweep_hours", 24)?
            .set_default("abandoned_sweep_interval_secs", 900)?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }
}
