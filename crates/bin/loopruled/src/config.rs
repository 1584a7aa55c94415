//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `looprule.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rule engine settings.
    pub engine: EngineConfig,
    /// Rule set loaded at startup.
    pub rules: RulesConfig,
    /// Simulated pump settings.
    #[serde(rename = "virtual")]
    pub pump: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Rule engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between two evaluation passes.
    pub evaluation_interval_secs: u64,
}

/// Startup rule import.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule-set file merged into the store at startup.
    pub import_path: Option<PathBuf>,
}

/// Virtual pump configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Delay before the simulated pump answers a command.
    pub latency_ms: u64,
    /// Feed simulated glucose readings.
    pub simulate_glucose: bool,
}

impl Config {
    /// Load configuration from `looprule.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("looprule.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LOOPRULE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("LOOPRULE_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("LOOPRULE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("LOOPRULE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("LOOPRULE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) =
            var("LOOPRULE_EVALUATION_INTERVAL_SECS").and_then(|val| val.parse().ok())
        {
            self.engine.evaluation_interval_secs = secs;
        }
        if let Some(val) = var("LOOPRULE_RULES_IMPORT") {
            self.rules.import_path = Some(PathBuf::from(val));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.evaluation_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "evaluation interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Time between two evaluation passes.
    #[must_use]
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.engine.evaluation_interval_secs)
    }

    /// Delay of the simulated pump.
    #[must_use]
    pub fn pump_latency(&self) -> Duration {
        Duration::from_millis(self.pump.latency_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:looprule.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "loopruled=info,looprule=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 60,
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            latency_ms: 500,
            simulate_glucose: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
