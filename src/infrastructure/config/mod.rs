use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::db::{CONNECTION_RETRY_DELAY, CONNECTION_RETRY_LIMIT};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Unset selects the in-memory backend.
    pub database_url: Option<String>,
    /// Unset runs the migrations embedded in the binary.
    pub migrations_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub db_connect_attempts: u32,
    pub db_connect_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: non_empty_var("DATABASE_URL"),
            migrations_dir: non_empty_var("MIGRATIONS_DIR").map(PathBuf::from),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            db_connect_attempts: env::var("DB_CONNECT_ATTEMPTS")
                .unwrap_or_else(|_| CONNECTION_RETRY_LIMIT.to_string())
                .parse()?,
            db_connect_delay_secs: env::var("DB_CONNECT_DELAY_SECS")
                .unwrap_or_else(|_| CONNECTION_RETRY_DELAY.as_secs().to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn db_connect_delay(&self) -> Duration {
        Duration::from_secs(self.db_connect_delay_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
