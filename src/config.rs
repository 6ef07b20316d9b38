use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database: DatabaseConfig {
                url: "sqlite://tasks.db".to_string(),
                max_connections: 20,
                idle_timeout: Duration::from_millis(30_000),
                connect_timeout: Duration::from_millis(2_000),
            },
        }
    }
}

impl AppConfig {
    /// Reads the process environment once, falling back to the defaults for
    /// every unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let url = lookup("DATABASE_URL").unwrap_or(defaults.database.url);
        let max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.database.max_connections)?;
        let idle_timeout =
            parse_millis_or(&lookup, "DB_IDLE_TIMEOUT_MS", defaults.database.idle_timeout)?;
        let connect_timeout =
            parse_millis_or(&lookup, "DB_CONNECT_TIMEOUT_MS", defaults.database.connect_timeout)?;

        Ok(Self {
            host,
            port,
            database: DatabaseConfig {
                url,
                max_connections,
                idle_timeout,
                connect_timeout,
            },
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: self.host.clone(),
            })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

fn parse_millis_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, name, default.as_millis() as u64).map(Duration::from_millis)
}
