//! Application configuration management.

use serde::Deserialize;

/// Deployment mode, taken from `RUN_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (verbose logs, relaxed rate limits).
    #[default]
    Development,
    /// Automated test runs.
    Test,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Parses a run mode, falling back to development for unknown values.
    #[must_use]
    pub fn from_run_mode(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Returns true in production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Default number of requests allowed per rate-limit window.
    #[must_use]
    pub const fn default_rate_limit(self) -> u32 {
        if self.is_production() { 5 } else { 100 }
    }

    /// Default tracing filter directive.
    #[must_use]
    pub const fn default_log_filter(self) -> &'static str {
        if self.is_production() {
            "cashtrackr=info,tower_http=info"
        } else {
            "cashtrackr=debug,tower_http=debug"
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment mode.
    #[serde(default)]
    pub environment: Environment,
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session token lifetime in days.
    #[serde(default = "default_session_token_expiry_days")]
    pub session_token_expiry_days: i64,
}

fn default_session_token_expiry_days() -> i64 {
    30
}

/// How outgoing mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    /// Deliver over SMTP.
    #[default]
    Smtp,
    /// Log messages and keep the most recent ones in memory.
    Log,
}

/// Email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Delivery mechanism.
    #[serde(default)]
    pub transport: EmailTransport,
    /// SMTP host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the web client, used in email links.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransport::default(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "admin@cashtrackr.com".to_string()
}

fn default_from_name() -> String {
    "CashTrackr".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

/// Fixed-window rate limit for the account routes.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Requests allowed per window; the environment default when unset.
    pub max_requests: Option<u32>,
    /// Key clients by `X-Forwarded-For` instead of the peer address.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: None,
            trust_proxy: false,
        }
    }
}

fn default_window_secs() -> u64 {
    60
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CASHTRACKR").separator("__"))
            .build()?;

        let mut app: Self = config.try_deserialize()?;
        app.environment = Environment::from_run_mode(&run_mode);
        Ok(app)
    }

    /// Requests allowed per rate-limit window after applying the environment default.
    #[must_use]
    pub fn rate_limit_max_requests(&self) -> u32 {
        self.rate_limit
            .max_requests
            .unwrap_or_else(|| self.environment.default_rate_limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_run_mode() {
        assert_eq!(
            Environment::from_run_mode("production"),
            Environment::Production
        );
        assert_eq!(Environment::from_run_mode("TEST"), Environment::Test);
        assert_eq!(
            Environment::from_run_mode("staging"),
            Environment::Development
        );
    }

    #[test]
    fn test_rate_limit_defaults_follow_environment() {
        assert_eq!(Environment::Production.default_rate_limit(), 5);
        assert_eq!(Environment::Development.default_rate_limit(), 100);
        assert_eq!(Environment::Test.default_rate_limit(), 100);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("production")),
                ("CASHTRACKR__DATABASE__URL", Some("postgres://localhost/cashtrackr")),
                ("CASHTRACKR__JWT__SECRET", Some("s3cret")),
                ("CASHTRACKR__EMAIL__TRANSPORT", Some("log")),
                ("CASHTRACKR__RATE_LIMIT__MAX_REQUESTS", None),
            ],
            || {
                let config = AppConfig::load().unwrap();

                assert_eq!(config.environment, Environment::Production);
                assert_eq!(config.database.url, "postgres://localhost/cashtrackr");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.secret, "s3cret");
                assert_eq!(config.jwt.session_token_expiry_days, 30);
                assert_eq!(config.email.transport, EmailTransport::Log);
                assert_eq!(config.server.port, 4000);
                assert_eq!(config.rate_limit.window_secs, 60);
                assert_eq!(config.rate_limit_max_requests(), 5);
                assert!(!config.rate_limit.trust_proxy);
            },
        );
    }
}
