/// Errors raised while reading database configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Upper bound on pooled connections (default: `20`).
    pub max_connections: u32,
    /// Seconds to wait for a free connection before failing (default: `5`).
    pub acquire_timeout_secs: u64,
}

impl DbConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `DATABASE_URL`            | required |
    /// | `DB_MAX_CONNECTIONS`      | `20`     |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`DbConfig::from_env`], but first loads a `.env` file if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?;
        let acquire_timeout_secs = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
