use crate::workflows::assessment::ClassificationMode;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub assessment: AssessmentConfig,
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

        let mode_raw =
            env::var("APP_CLASSIFICATION_MODE").unwrap_or_else(|_| "population".to_string());
        let classification_mode = ClassificationMode::parse(&mode_raw)
            .ok_or(ConfigError::InvalidClassificationMode { value: mode_raw })?;

        let import_ttl_minutes = env::var("APP_IMPORT_TTL_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidImportTtl)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assessment: AssessmentConfig {
                classification_mode,
                import_ttl_minutes,
            },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Classification algorithm and import staging lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentConfig {
    pub classification_mode: ClassificationMode,
    pub import_ttl_minutes: u32,
}

impl AssessmentConfig {
    pub fn import_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.import_ttl_minutes))
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            classification_mode: ClassificationMode::Population,
            import_ttl_minutes: 30,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidClassificationMode { value: String },
    InvalidImportTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidClassificationMode { value } => write!(
                f,
                "APP_CLASSIFICATION_MODE must be 'population' or 'percentage' (found '{}')",
                value
            ),
            ConfigError::InvalidImportTtl => {
                write!(f, "APP_IMPORT_TTL_MINUTES must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidClassificationMode { .. }
            | ConfigError::InvalidImportTtl => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_CLASSIFICATION_MODE");
        env::remove_var("APP_IMPORT_TTL_MINUTES");
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
        assert_eq!(config.assessment, AssessmentConfig::default());
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
    fn reads_percentage_mode_and_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CLASSIFICATION_MODE", " Percentage ");
        env::set_var("APP_IMPORT_TTL_MINUTES", "5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.assessment.classification_mode,
            ClassificationMode::Percentage
        );
        assert_eq!(config.assessment.import_ttl(), chrono::Duration::minutes(5));
        reset_env();
    }

    #[test]
    fn rejects_unknown_mode_and_zero_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CLASSIFICATION_MODE", "curve");
        match AppConfig::load() {
            Err(ConfigError::InvalidClassificationMode { value }) => assert_eq!(value, "curve"),
            other => panic!("expected invalid mode, got {other:?}"),
        }

        reset_env();
        env::set_var("APP_IMPORT_TTL_MINUTES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidImportTtl)
        ));
        reset_env();
    }
}
