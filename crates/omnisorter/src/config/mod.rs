use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::request::{DatabaseIds, HiddenFieldPolicy, PropertyMapping, UnknownPolicy};

pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

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
    pub notion: NotionConfig,
    pub form: FormConfig,
    pub properties: PropertyMapping,
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
        let log_format = match optional("APP_LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value)?,
            None => LogFormat::Compact,
        };

        let notion = NotionConfig {
            api_key: optional("NOTION_API_KEY"),
            api_base: optional("NOTION_API_BASE")
                .unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string()),
            version: optional("NOTION_VERSION")
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            request_database_id: optional("NOTION_DATABASE_ID"),
            customer_database_id: optional("CUSTOMER_DB_ID"),
            project_database_id: optional("PROJECT_DB_ID"),
        };

        let hidden_fields = match optional("OMNISORTER_HIDDEN_FIELDS") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidPolicy { source })?,
            None => HiddenFieldPolicy::default(),
        };

        let mut properties = PropertyMapping::default();
        properties.apply_overrides(|suffix| env::var(format!("NOTION_PROP_{suffix}")).ok());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            notion,
            form: FormConfig { hidden_fields },
            properties,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Notion credentials and database ids. Only the request database is needed
/// to store requests; the customer and project masters enable linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub version: String,
    pub request_database_id: Option<String>,
    pub customer_database_id: Option<String>,
    pub project_database_id: Option<String>,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_NOTION_API_BASE.to_string(),
            version: DEFAULT_NOTION_VERSION.to_string(),
            request_database_id: None,
            customer_database_id: None,
            project_database_id: None,
        }
    }
}

impl NotionConfig {
    pub fn databases(&self) -> DatabaseIds {
        DatabaseIds {
            requests: self.request_database_id.clone(),
            customers: self.customer_database_id.clone(),
            projects: self.project_database_id.clone(),
        }
    }
}

/// Form session behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormConfig {
    pub hidden_fields: HiddenFieldPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPolicy { source: UnknownPolicy },
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPolicy { source } => {
                write!(f, "OMNISORTER_HIDDEN_FIELDS must be purge or retain ({source})")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be compact or full, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidLogFormat(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPolicy { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARIABLES: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "APP_LOG_FORMAT",
        "NOTION_API_KEY",
        "NOTION_API_BASE",
        "NOTION_VERSION",
        "NOTION_DATABASE_ID",
        "CUSTOMER_DB_ID",
        "PROJECT_DB_ID",
        "OMNISORTER_HIDDEN_FIELDS",
        "NOTION_PROP_MODEL",
        "NOTION_PROP_CUSTOMER_RELATION",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in VARIABLES {
            env::remove_var(name);
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
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.notion, NotionConfig::default());
        assert_eq!(config.form.hidden_fields, HiddenFieldPolicy::Purge);
        assert_eq!(config.properties, PropertyMapping::default());
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
    fn reads_notion_settings_and_property_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("NOTION_API_KEY", "secret_abc");
        env::set_var("NOTION_DATABASE_ID", " req-db ");
        env::set_var("CUSTOMER_DB_ID", "");
        env::set_var("PROJECT_DB_ID", "proj-db");
        env::set_var("OMNISORTER_HIDDEN_FIELDS", "retain");
        env::set_var("NOTION_PROP_MODEL", "依頼機種");
        env::set_var("NOTION_PROP_CUSTOMER_RELATION", "顧客");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.notion.api_key.as_deref(), Some("secret_abc"));
        let databases = config.notion.databases();
        assert_eq!(databases.requests.as_deref(), Some("req-db"));
        assert_eq!(databases.customers, None);
        assert!(!databases.master_data_enabled());
        assert_eq!(config.form.hidden_fields, HiddenFieldPolicy::Retain);
        assert_eq!(config.properties.model, "依頼機種");
        assert_eq!(config.properties.customer_relation, "顧客");
    }

    #[test]
    fn rejects_unknown_policy_and_log_format() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OMNISORTER_HIDDEN_FIELDS", "sometimes");
        let error = AppConfig::load().expect_err("policy rejected");
        assert!(matches!(error, ConfigError::InvalidPolicy { .. }));

        reset_env();
        env::set_var("APP_LOG_FORMAT", "xml");
        let error = AppConfig::load().expect_err("format rejected");
        assert_eq!(
            error.to_string(),
            "APP_LOG_FORMAT must be compact or full, got 'xml'"
        );
        reset_env();
    }
}
