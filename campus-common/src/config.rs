//! Configuration loading and resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`] (the binary's argument
//! parser reads both); the secrets of the payment gateway are read from the
//! environment here so that they never need to appear on a command line.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Courses that are auto-approved and never expire
pub const DEFAULT_FREE_COURSES: [&str; 2] = ["ON-GR-FL-A1", "ON-FR-FL-A1"];

/// Capacity used when a batch has no usable `max_students`
pub const DEFAULT_MAX_STUDENTS: i64 = 10;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:3006";

/// Default payment gateway API root
pub const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com/v1";

/// Default upper bound for lock-contention retries
pub const DEFAULT_DB_MAX_LOCK_WAIT_MS: u64 = 5000;

/// On-disk TOML configuration (every field optional)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub free_courses: Option<Vec<String>>,
    pub default_max_students: Option<i64>,
    pub cors_origins: Option<Vec<String>>,
    pub db_max_lock_wait_ms: Option<u64>,
    pub razorpay: RazorpayToml,
}

/// `[razorpay]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RazorpayToml {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub base_url: Option<String>,
}

/// Values supplied on the command line or through their environment fallbacks
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub free_courses: Option<Vec<String>>,
    pub cors_origins: Option<Vec<String>>,
}

/// Payment gateway credentials
#[derive(Clone, Default)]
pub struct RazorpayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "<redacted>"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct CampusConfig {
    pub database_path: PathBuf,
    pub bind: String,
    pub free_courses: Vec<String>,
    pub default_max_students: i64,
    pub cors_origins: Vec<String>,
    pub db_max_lock_wait_ms: u64,
    pub razorpay: RazorpayConfig,
}

impl CampusConfig {
    /// Merge overrides, environment secrets, the TOML file and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let bind = overrides
            .bind
            .or(toml_config.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let free_courses = overrides
            .free_courses
            .or(toml_config.free_courses)
            .unwrap_or_else(|| DEFAULT_FREE_COURSES.iter().map(|c| c.to_string()).collect());
        let free_courses = normalize_list(free_courses);

        let default_max_students = toml_config
            .default_max_students
            .unwrap_or(DEFAULT_MAX_STUDENTS);
        if default_max_students <= 0 {
            return Err(Error::Config(format!(
                "default_max_students must be positive, got {}",
                default_max_students
            )));
        }

        let cors_origins = normalize_list(
            overrides
                .cors_origins
                .or(toml_config.cors_origins)
                .unwrap_or_default(),
        );

        let razorpay = RazorpayConfig {
            key_id: env_or("RAZORPAY_KEY_ID", toml_config.razorpay.key_id),
            key_secret: env_or("RAZORPAY_SECRET", toml_config.razorpay.key_secret),
            webhook_secret: env_or("RAZORPAY_WEBHOOK_SECRET", toml_config.razorpay.webhook_secret),
            base_url: toml_config
                .razorpay
                .base_url
                .unwrap_or_else(|| DEFAULT_RAZORPAY_BASE_URL.to_string()),
        };

        Ok(Self {
            database_path,
            bind,
            free_courses,
            default_max_students,
            cors_origins,
            db_max_lock_wait_ms: toml_config
                .db_max_lock_wait_ms
                .unwrap_or(DEFAULT_DB_MAX_LOCK_WAIT_MS),
            razorpay,
        })
    }
}

/// Load the TOML configuration file
///
/// An explicit path must exist. Without one, the per-user and system-wide
/// locations are tried; when neither exists the defaults are used. A file
/// that exists but does not parse is always an error.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_file() {
            Some(path) => path,
            None => {
                info!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}

/// First existing config file among the standard locations
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("campus").join("campus.toml"));
    let system_config = PathBuf::from("/etc/campus/campus.toml");

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|p| p.exists())
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("campus"))
        .unwrap_or_else(|| PathBuf::from("./campus_data"))
        .join("campus.db")
}

fn env_or(name: &str, fallback: Option<String>) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!("{} is set but empty, ignoring", name);
            fallback
        }
        Err(_) => fallback,
    }
}

fn normalize_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Split a comma-separated list (`"a, b,,c"` -> `["a", "b", "c"]`)
pub fn split_list(value: &str) -> Vec<String> {
    normalize_list(value.split(',').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(split_list(" a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = parse_toml_config(
            r#"
            bind = "0.0.0.0:8080"
            free_courses = ["FREE-1"]

            [razorpay]
            key_id = "rzp_test"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.free_courses, Some(vec!["FREE-1".to_string()]));
        assert_eq!(config.razorpay.key_id.as_deref(), Some("rzp_test"));
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(parse_toml_config("bind = [").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RazorpayConfig {
            key_id: Some("id".into()),
            key_secret: Some("very-secret".into()),
            webhook_secret: None,
            base_url: DEFAULT_RAZORPAY_BASE_URL.into(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
