use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub dispatch: DispatchConfig,
    pub sweep: SweepConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Server-side limit for any single statement
    pub statement_timeout: Duration,
}

/// Settings for building and delivering notification messages
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Link substituted for `{link_area_membros}` in message templates
    pub member_area_url: String,
    /// Upper bound for a single webhook call
    pub webhook_timeout: Duration,
}

/// Queue sweeper tuning
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Max records selected per sweep
    pub batch_size: i64,
    /// Stop picking up new records once a sweep has run this long
    pub deadline: Duration,
    /// Interval for the in-process sweep worker. Zero disables it.
    pub interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            dispatch: DispatchConfig::from_env(),
            sweep: SweepConfig::from_env(),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1),
            acquire_timeout: Duration::from_secs(env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)),
            idle_timeout: Duration::from_secs(env_or("DATABASE_IDLE_TIMEOUT_SECS", 600)),
            max_lifetime: Duration::from_secs(env_or("DATABASE_MAX_LIFETIME_SECS", 1800)),
            statement_timeout: Duration::from_secs(
                env_or::<u64>("DATABASE_STATEMENT_TIMEOUT_SECS", 30).max(1),
            ),
        })
    }
}

impl DispatchConfig {
    pub fn from_env() -> Self {
        Self {
            member_area_url: env::var("MEMBER_AREA_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "http://localhost:3000/member-area".to_string()),
            webhook_timeout: Duration::from_secs(env_or("WEBHOOK_TIMEOUT_SECS", 15)),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            member_area_url: "http://localhost:3000/member-area".to_string(),
            webhook_timeout: Duration::from_secs(15),
        }
    }
}

impl SweepConfig {
    pub fn from_env() -> Self {
        Self {
            batch_size: env_or::<i64>("SWEEP_BATCH_SIZE", 100).max(1),
            deadline: Duration::from_secs(env_or("SWEEP_DEADLINE_SECS", 50)),
            interval: Duration::from_secs(env_or("SWEEP_INTERVAL_SECS", 0)),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            deadline: Duration::from_secs(50),
            interval: Duration::ZERO,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a valid number")]
    InvalidPort,
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,
}
