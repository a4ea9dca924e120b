// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Loads the orchestrator's TOML configuration file (§6), following the
//! exact search order of `original_source/src/passari_workflow/config.py`:
//!
//! 1. `<APP_NAME>_CONFIG_PATH` environment variable (app name upper-cased,
//!    `-` replaced by `_`), if set and the path is readable.
//! 2. `/etc/<app_name>/config.toml`.
//! 3. A per-user application directory. If none of the above sources exist,
//!    a default document is written there so subsequent runs find it.
//!
//! ## Immutability
//!
//! `AppConfig` is immutable after [`AppConfig::load`]: delays are parsed
//! into [`std::time::Duration`] once, at load time, and threaded through as
//! explicit parameters from there on — never re-read from a global at
//! predicate-evaluation time (§9's Design Notes).

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default preservation/update delay: 30 days, in seconds.
const DEFAULT_DELAY_SECS: u64 = 2_592_000;

/// Numeric logging threshold (§6): 50 critical, 40 error, 30 warning, 20
/// info, 10 debug — mirroring `config.py`'s `DEFAULT_CONFIG` comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub i64);

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(20)
    }
}

impl LogLevel {
    /// Convert the numeric threshold to a [`tracing::Level`].
    pub fn to_tracing_level(self) -> tracing::Level {
        match self.0 {
            n if n >= 40 => tracing::Level::ERROR,
            n if n >= 30 => tracing::Level::WARN,
            n if n >= 20 => tracing::Level::INFO,
            n if n >= 10 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DbConfig {
    /// Assembles a `postgres://` connection string for
    /// `preservation-engine::infrastructure::db::pool::connect`.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{name}",
            user = self.user,
            password = self.password,
            host = self.host,
            port = self.port,
            name = self.name,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl RedisConfig {
    /// Assembles a `redis://` connection string. An empty password (the
    /// default) is omitted rather than sent as an empty credential.
    pub fn connection_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}", self.host, self.port)
        } else {
            format!("redis://:{}@{}:{}", self.password, self.host, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub package_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub preservation_delay: Duration,
    pub update_delay: Duration,
}

/// Validated, immutable application configuration (§6).
#[derive(Debug, Clone)]
pub struct AppConfig {
    app_name: String,
    logging: LogLevel,
    db: DbConfig,
    redis: RedisConfig,
    package: PackageConfig,
    verbose: bool,
}

impl AppConfig {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn logging(&self) -> LogLevel {
        self.logging
    }

    pub fn db(&self) -> &DbConfig {
        &self.db
    }

    pub fn redis(&self) -> &RedisConfig {
        &self.redis
    }

    pub fn package(&self) -> &PackageConfig {
        &self.package
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// `--verbose` is a CLI overlay on top of the loaded document, not a
    /// config-file option, so it is applied after load rather than parsed.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Loads configuration for `app_name`, following the search order
    /// documented on the module. `config_path_override` takes precedence
    /// over the environment variable and is how `--config` on the CLI
    /// short-circuits the search.
    pub fn load(app_name: &str, config_path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let raw_text = read_raw(app_name, config_path_override)?;
        let raw: RawConfig = toml::from_str(&raw_text)?;
        Self::from_raw(app_name, raw)
    }

    fn from_raw(app_name: &str, raw: RawConfig) -> Result<Self, ConfigError> {
        let db_port = raw.db.port.parse::<u16>().map_err(|_| ConfigError::InvalidPort("db.port", raw.db.port.clone()))?;
        let redis_port = raw.redis.port.parse::<u16>().map_err(|_| ConfigError::InvalidPort("redis.port", raw.redis.port.clone()))?;

        Ok(Self {
            app_name: app_name.to_string(),
            logging: LogLevel(raw.logging.level),
            db: DbConfig {
                user: raw.db.user,
                password: raw.db.password,
                host: raw.db.host,
                port: db_port,
                name: raw.db.name,
            },
            redis: RedisConfig {
                host: raw.redis.host,
                port: redis_port,
                password: raw.redis.password,
            },
            package: PackageConfig {
                package_dir: PathBuf::from(raw.package.package_dir),
                archive_dir: PathBuf::from(raw.package.archive_dir),
                preservation_delay: Duration::from_secs(raw.package.preservation_delay),
                update_delay: Duration::from_secs(raw.package.update_delay),
            },
            verbose: false,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("writing default config to {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no per-user config directory could be determined for application {0:?}")]
    NoUserConfigDir(String),
    #[error("invalid {0} value {1:?}: expected a port number")]
    InvalidPort(&'static str, String),
}

fn read_raw(app_name: &str, config_path_override: Option<&Path>) -> Result<String, ConfigError> {
    if let Some(path) = config_path_override {
        return std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source });
    }

    let env_name = format!("{}_CONFIG_PATH", app_name.to_uppercase().replace('-', "_"));
    if let Ok(path) = std::env::var(&env_name) {
        let path = PathBuf::from(path);
        return std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source });
    }

    let system_path = Path::new("/etc").join(app_name).join("config.toml");
    if system_path.is_file() {
        return std::fs::read_to_string(&system_path).map_err(|source| ConfigError::Read { path: system_path, source });
    }

    let dirs = ProjectDirs::from("", "", app_name).ok_or_else(|| ConfigError::NoUserConfigDir(app_name.to_string()))?;
    let local_path = dirs.config_dir().join("config.toml");
    if local_path.is_file() {
        return std::fs::read_to_string(&local_path).map_err(|source| ConfigError::Read { path: local_path, source });
    }

    std::fs::create_dir_all(dirs.config_dir()).map_err(|source| ConfigError::Write { path: dirs.config_dir().to_path_buf(), source })?;
    let default = default_config_toml();
    std::fs::write(&local_path, &default).map_err(|source| ConfigError::Write { path: local_path, source })?;
    Ok(default)
}

/// Mirrors `config.py`'s `DEFAULT_CONFIG` verbatim (values, not comments).
fn default_config_toml() -> String {
    format!(
        "[logging]\nlevel=20\n\n[db]\nuser=''\npassword=''\nhost='127.0.0.1'\nport='5432'\nname='preservation'\n\n\
         [redis]\nhost='127.0.0.1'\nport='6379'\npassword=''\n\n\
         [package]\npackage_dir=''\narchive_dir=''\npreservation_delay={delay}\nupdate_delay={delay}\n",
        delay = DEFAULT_DELAY_SECS,
    )
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    logging: RawLogging,
    db: RawDb,
    #[serde(default)]
    redis: RawRedis,
    package: RawPackage,
}

#[derive(Debug, Deserialize)]
struct RawLogging {
    #[serde(default = "default_level")]
    level: i64,
}

impl Default for RawLogging {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

fn default_level() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
struct RawDb {
    #[serde(default)]
    user: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_db_host")]
    host: String,
    #[serde(default = "default_db_port")]
    port: String,
    #[serde(default = "default_db_name")]
    name: String,
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_port() -> String {
    "5432".to_string()
}

fn default_db_name() -> String {
    "preservation".to_string()
}

#[derive(Debug, Deserialize)]
struct RawRedis {
    #[serde(default = "default_redis_host")]
    host: String,
    #[serde(default = "default_redis_port")]
    port: String,
    #[serde(default)]
    password: String,
}

impl Default for RawRedis {
    fn default() -> Self {
        Self { host: default_redis_host(), port: default_redis_port(), password: String::new() }
    }
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> String {
    "6379".to_string()
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    #[serde(default)]
    package_dir: String,
    #[serde(default)]
    archive_dir: String,
    #[serde(default = "default_delay")]
    preservation_delay: u64,
    #[serde(default = "default_delay")]
    update_delay: u64,
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_thresholds() {
        assert_eq!(LogLevel(50).to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel(40).to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel(30).to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel(20).to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel(10).to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel(0).to_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_log_level_default_is_info() {
        assert_eq!(LogLevel::default().to_tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_from_raw_parses_ports_and_delays() {
        let raw: RawConfig = toml::from_str(&default_config_toml()).expect("default document parses");
        let config = AppConfig::from_raw("preservation-workflow", raw).expect("valid ports");
        assert_eq!(config.db().port, 5432);
        assert_eq!(config.redis().port, 6379);
        assert_eq!(config.package().preservation_delay, Duration::from_secs(DEFAULT_DELAY_SECS));
        assert_eq!(config.package().update_delay, Duration::from_secs(DEFAULT_DELAY_SECS));
    }

    #[test]
    fn test_from_raw_rejects_non_numeric_port() {
        let mut raw: RawConfig = toml::from_str(&default_config_toml()).expect("default document parses");
        raw.db.port = "not-a-port".to_string();
        let err = AppConfig::from_raw("preservation-workflow", raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort("db.port", _)));
    }

    #[test]
    fn test_redis_connection_url_omits_empty_password() {
        let config = RedisConfig { host: "127.0.0.1".to_string(), port: 6379, password: String::new() };
        assert_eq!(config.connection_url(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_redis_connection_url_includes_password_when_set() {
        let config = RedisConfig { host: "127.0.0.1".to_string(), port: 6379, password: "secret".to_string() };
        assert_eq!(config.connection_url(), "redis://:secret@127.0.0.1:6379");
    }

    #[test]
    fn test_db_connection_url_shape() {
        let config = DbConfig {
            user: "pas".to_string(),
            password: "pw".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5432,
            name: "preservation".to_string(),
        };
        assert_eq!(config.connection_url(), "postgres://pas:pw@127.0.0.1:5432/preservation");
    }

    #[test]
    fn test_with_verbose_overlay() {
        let raw: RawConfig = toml::from_str(&default_config_toml()).expect("default document parses");
        let config = AppConfig::from_raw("preservation-workflow", raw).expect("valid").with_verbose(true);
        assert!(config.is_verbose());
    }
}
