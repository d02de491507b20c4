use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{ConnectOptions, PgPool};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    InvalidNumber {
        var: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid HOST address: {0}")]
    InvalidHost(String),
    #[error("Invalid RUN_MODE: {0} (expected debug or release)")]
    InvalidRunMode(String),
    #[error("Invalid TODO_STORE: {0} (expected postgres or memory)")]
    InvalidStore(String),
    #[error("Invalid DB_SSLMODE: {0}")]
    InvalidSslMode(String),
    #[error("Invalid boolean for {var}: {value}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Debug,
    Release,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(RunMode::Debug),
            "release" => Ok(RunMode::Release),
            _ => Err(ConfigError::InvalidRunMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidStore(s.to_string())),
        }
    }
}

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    /// A `*` anywhere in the list opens the API to every origin.
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if origins.iter().any(|origin| origin == "*") {
            return CorsOrigins::Any;
        }
        CorsOrigins::List(origins)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self, run_mode: RunMode) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode);
        match run_mode {
            RunMode::Debug => options,
            RunMode::Release => options.disable_statement_logging(),
        }
    }

    /// Open a pool and check that the database is reachable. Fails rather
    /// than returning a pool that would error on first use.
    pub async fn connect(&self, run_mode: RunMode) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(self.connect_options(run_mode))
            .await
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub run_mode: RunMode,
    pub store: StoreBackend,
    pub seed: bool,
    pub database: DatabaseConfig,
    pub cors_origins: CorsOrigins,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse_port("PORT", &get("PORT", "8080"))?;

        let host_str = get("HOST", "0.0.0.0");
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let run_mode = get("RUN_MODE", "debug").parse::<RunMode>()?;
        let store = get("TODO_STORE", "postgres").parse::<StoreBackend>()?;
        let seed = parse_bool("TODO_SEED", &get("TODO_SEED", "false"))?;

        let ssl_str = get("DB_SSLMODE", "disable");
        let ssl_mode = ssl_str
            .parse::<PgSslMode>()
            .map_err(|_| ConfigError::InvalidSslMode(ssl_str.clone()))?;

        let max_connections = get("DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|source| ConfigError::InvalidNumber {
                var: "DB_MAX_CONNECTIONS",
                source,
            })?;

        let database = DatabaseConfig {
            host: get("DB_HOST", "localhost"),
            port: parse_port("DB_PORT", &get("DB_PORT", "5432"))?,
            user: get("DB_USER", "todos"),
            password: get("DB_PASSWORD", "password"),
            name: get("DB_NAME", "todos"),
            ssl_mode,
            max_connections,
        };

        let cors_origins = CorsOrigins::parse(&get(
            "CORS_ALLOWED_ORIGINS",
            "http://localhost:3000,http://localhost:5173",
        ));

        Ok(Config {
            host,
            port,
            run_mode,
            store,
            seed,
            database,
            cors_origins,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    let port = value
        .parse::<u16>()
        .map_err(|source| ConfigError::InvalidNumber { var, source })?;
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(port));
    }
    Ok(port)
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
