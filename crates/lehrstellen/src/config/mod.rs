use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::listing::pager::DEFAULT_PAGE_SIZE;
use crate::listing::session::DEFAULT_TRANSITION_DELAY;
use crate::listing::DataLocation;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub listing: ListingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            listing: ListingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Dataset locations and listing behavior.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub postings: DataLocation,
    pub cantons: DataLocation,
    pub page_size: usize,
    pub transition_delay: Duration,
    /// Explicit profession options; derived from the dataset when `None`.
    pub professions: Option<Vec<String>>,
}

impl ListingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let postings = env::var("APP_POSTINGS_SOURCE")
            .unwrap_or_else(|_| "data/berufsberatung.json".to_string());
        let cantons =
            env::var("APP_CANTONS_SOURCE").unwrap_or_else(|_| "data/zipToCanton.json".to_string());

        let page_size = match env::var("APP_PAGE_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPageSize)?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let transition_delay = match env::var("APP_TRANSITION_DELAY_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidTransitionDelay)?,
            Err(_) => DEFAULT_TRANSITION_DELAY,
        };

        let professions = env::var("APP_PROFESSIONS").ok().and_then(|raw| {
            let list: Vec<String> = raw
                .split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect();
            (!list.is_empty()).then_some(list)
        });

        Ok(Self {
            postings: DataLocation::parse(&postings),
            cantons: DataLocation::parse(&cantons),
            page_size,
            transition_delay,
            professions,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidPageSize,
    InvalidTransitionDelay,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty', got '{value}'")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "APP_PAGE_SIZE must be a positive integer")
            }
            ConfigError::InvalidTransitionDelay => {
                write!(f, "APP_TRANSITION_DELAY_MS must be a whole number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_POSTINGS_SOURCE",
            "APP_CANTONS_SOURCE",
            "APP_PAGE_SIZE",
            "APP_TRANSITION_DELAY_MS",
            "APP_PROFESSIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.listing.transition_delay, Duration::from_millis(300));
        assert_eq!(
            config.listing.postings,
            DataLocation::Path(PathBuf::from("data/berufsberatung.json"))
        );
        assert!(config.listing.professions.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_listing_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CANTONS_SOURCE", "https://example.ch/zipToCanton.json");
        env::set_var("APP_PAGE_SIZE", "25");
        env::set_var("APP_TRANSITION_DELAY_MS", "0");
        env::set_var(
            "APP_PROFESSIONS",
            "Metallbauer/-in (Metallbau) EFZ; Metallbaupraktiker/-in EBA;",
        );

        let config = AppConfig::load().expect("config loads");

        assert_eq!(
            config.listing.cantons,
            DataLocation::Url("https://example.ch/zipToCanton.json".to_string())
        );
        assert_eq!(config.listing.page_size, 25);
        assert!(config.listing.transition_delay.is_zero());
        assert_eq!(
            config.listing.professions,
            Some(vec![
                "Metallbauer/-in (Metallbau) EFZ".to_string(),
                "Metallbaupraktiker/-in EBA".to_string(),
            ])
        );
        reset_env();
    }

    #[test]
    fn rejects_zero_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PAGE_SIZE", "0");
        let err = AppConfig::load().expect_err("zero page size is invalid");
        assert!(matches!(err, ConfigError::InvalidPageSize));
        reset_env();
    }
}
