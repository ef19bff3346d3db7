use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub lock: LockConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LockConfig {
    /// Independent lock nodes; majority acceptance is required, so run an
    /// odd number.
    pub node_urls: Vec<String>,
    #[serde(default = "default_node_timeout_millis")]
    pub node_timeout_millis: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_seat_hold_seconds")]
    pub seat_hold_seconds: u64,
    #[serde(default = "default_denial_marker_seconds")]
    pub denial_marker_seconds: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_secs() -> u64 { 3 }
fn default_node_timeout_millis() -> u64 { 200 }
fn default_seat_hold_seconds() -> u64 { 10 }
fn default_denial_marker_seconds() -> u64 { 600 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `BOXOFFICE__SERVER__PORT=8080` would set server.port
            .add_source(config::Environment::with_prefix("BOXOFFICE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
