use crate::errors::AppError;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub server_port: u16,
    pub rust_log: String,
    pub backend_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let db_url = env::var("DATABASE_URL").unwrap_or("sqlite:./todo.db".to_string());

        let server_port = match env::var("SERVER_PORT") {
            Ok(port_str) => port_str.parse::<u16>().map_err(|_| {
                AppError::Config(format!(
                    "SERVER_PORT '{}' is not a valid port number",
                    port_str
                ))
            })?,
            Err(_) => 8080, // Default
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let backend_timeout = match env::var("BACKEND_TIMEOUT_MS") {
            Ok(ms_str) => parse_timeout_ms(&ms_str)?,
            Err(_) => Duration::from_millis(5000),
        };

        Ok(Config {
            db_url,
            server_port,
            rust_log,
            backend_timeout,
        })
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, AppError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(AppError::Config(format!(
            "BACKEND_TIMEOUT_MS '{}' must be a positive number of milliseconds",
            raw
        ))),
    }
}
