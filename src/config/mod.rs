use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub processing: ProcessingConfig,
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
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let process_modify_events = parse_switch(env::var("PROCESS_MODIFY_EVENTS").ok())?;
        let document_directory =
            env::var("CERT_DOCUMENT_DIR").unwrap_or_else(|_| "CVS".to_string());
        let output_directory = PathBuf::from(
            env::var("CERT_OUTPUT_DIR").unwrap_or_else(|_| "./certificates".to_string()),
        );
        let reference_data = env::var("CERT_REFERENCE_DATA")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            processing: ProcessingConfig {
                process_modify_events,
                document_directory,
                output_directory,
                reference_data,
            },
        })
    }
}

fn parse_switch(raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Err(ConfigError::MissingModifySwitch);
    };

    match raw.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidModifySwitch { value: raw }),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Line format of emitted log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Change-feed handling and the locations used by the bundled adapters.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub process_modify_events: bool,
    pub document_directory: String,
    pub output_directory: PathBuf,
    pub reference_data: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingModifySwitch,
    InvalidModifySwitch { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingModifySwitch => {
                write!(f, "PROCESS_MODIFY_EVENTS must be set to 'true' or 'false'")
            }
            ConfigError::InvalidModifySwitch { value } => write!(
                f,
                "PROCESS_MODIFY_EVENTS must be 'true' or 'false', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingModifySwitch
            | ConfigError::InvalidModifySwitch { .. } => None,
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
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("CERT_DOCUMENT_DIR");
        env::remove_var("CERT_OUTPUT_DIR");
        env::remove_var("CERT_REFERENCE_DATA");
        env::set_var("PROCESS_MODIFY_EVENTS", "false");
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
        assert!(!config.processing.process_modify_events);
        assert_eq!(config.processing.document_directory, "CVS");
        assert!(config.processing.reference_data.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn modify_switch_is_case_sensitive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PROCESS_MODIFY_EVENTS", "TRUE");
        let err = AppConfig::load().expect_err("upper-case switch rejected");
        assert!(matches!(err, ConfigError::InvalidModifySwitch { .. }));
        assert!(matches!(
            parse_switch(Some(" true ".to_string())),
            Err(ConfigError::InvalidModifySwitch { .. })
        ));
    }

    #[test]
    fn unrecognised_modify_switch_is_fatal() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PROCESS_MODIFY_EVENTS", "sometimes");
        let err = AppConfig::load().expect_err("invalid switch rejected");
        assert!(matches!(err, ConfigError::InvalidModifySwitch { .. }));
    }

    #[test]
    fn missing_modify_switch_is_fatal() {
        assert!(matches!(
            parse_switch(None),
            Err(ConfigError::MissingModifySwitch)
        ));
    }
}
