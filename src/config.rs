//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

/// Path appended to the API base URL for per-project report lookups.
pub const PROJECT_REPORTS_PATH: &str = "/api/reports/project";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_SMTP_HOST: &str = "localhost";
    pub const DEV_SMTP_PORT: u16 = 587;
    pub const DEV_MAIL_ADDRESS: &str = "reports@localhost";
    pub const DEV_API_BASE_URL: &str = "http://localhost:5000";

    pub const FROM_NAME: &str = "Smoke Testing Reports";
    pub const SUBJECT: &str = "Smoke Testing Report Websites";
    pub const FETCH_TIMEOUT_SECS: u64 = 30;
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Projects reported on when no identifiers are supplied.
    pub const PROJECT_IDS: [&str; 6] = [
        "68b05ec609d4cadd37167c7e", // vysaha
        "68b0225f2359580bbd1c5bea", // skillcencus
        "68b022552359580bbd1c5be9", // prapti
        "68b022482359580bbd1c5be8", // jayaho
        "68b0223b2359580bbd1c5be7", // ccctraining
        "68b022292359580bbd1c5be6", // cccsnv
    ];
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection (local relays, mail catchers).
    None,
    /// Plain connection upgraded with STARTTLS (port 587).
    StartTls,
    /// Implicit TLS from the first byte (port 465).
    Tls,
}

impl SmtpSecurity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "plain" => Some(Self::None),
            "starttls" => Some(Self::StartTls),
            "tls" | "ssl" => Some(Self::Tls),
            _ => None,
        }
    }
}

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    /// Login user; no authentication is attempted when unset
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// Sender, recipients and subject of outgoing notifications.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,
    pub to: Vec<String>,
    /// Subject prefix for single-report notifications
    pub subject: String,
}

impl MailConfig {
    /// Sender formatted as an RFC 5322 mailbox.
    pub fn from_mailbox(&self) -> String {
        if self.from_name.is_empty() {
            self.from_address.clone()
        } else {
            format!("\"{}\" <{}>", self.from_name, self.from_address)
        }
    }
}

/// Report source configuration.
#[derive(Debug, Clone)]
pub struct ReportSourceConfig {
    /// Base URL of the reporting API
    pub api_base_url: String,
    /// URL returning a single bare report for the single-report pipeline
    pub report_url: String,
    /// Upper bound for one project fetch
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ReportSourceConfig {
    /// Endpoint that per-project identifiers are appended to.
    pub fn project_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            PROJECT_REPORTS_PATH
        )
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub report_source: ReportSourceConfig,
    /// Link rendered as a call to action in the notification
    pub dashboard_url: Option<String>,
    /// Projects used by the default multi-project run
    pub project_ids: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a development default. In production mode
    /// (RUST_ENV=production) the loaded values are checked against those
    /// defaults and loading fails if any are still in use.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production, default: development)
    /// - `EMAIL_HOST`: SMTP host (default: localhost)
    /// - `EMAIL_PORT`: SMTP port (default: 587)
    /// - `EMAIL_SECURITY`: none/starttls/tls (default: starttls)
    /// - `EMAIL_USER` / `EMAIL_PASSWORD`: SMTP credentials (optional)
    /// - `EMAIL_FROM` / `EMAIL_FROM_NAME`: Sender address and display name
    /// - `EMAIL_TO`: Comma-separated recipients
    /// - `EMAIL_SUBJECT`: Subject prefix for single reports
    /// - `API_BASE_URL`: Reporting API base URL (default: http://localhost:5000)
    /// - `REPORT_URL`: Single-report URL (default: API_BASE_URL)
    /// - `REPORT_FETCH_TIMEOUT_SECS`: Per-project fetch timeout (default: 30)
    /// - `REPORT_PROJECT_IDS`: Comma-separated default project ids
    /// - `DASHBOARD_URL`: Dashboard link shown in the email (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("RUST_ENV") {
            Ok(value) => Environment::parse(&value).ok_or(ConfigError::InvalidValue(
                "RUST_ENV must be 'development' or 'production'",
            ))?,
            Err(_) => Environment::Development,
        };

        let host = env::var("EMAIL_HOST").unwrap_or_else(|_| defaults::DEV_SMTP_HOST.to_string());

        let port = env::var("EMAIL_PORT")
            .unwrap_or_else(|_| defaults::DEV_SMTP_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("EMAIL_PORT must be a valid port number"))?;

        let security = match env::var("EMAIL_SECURITY") {
            Ok(value) => SmtpSecurity::parse(&value).ok_or(ConfigError::InvalidValue(
                "EMAIL_SECURITY must be 'none', 'starttls' or 'tls'",
            ))?,
            // Port 465 speaks TLS from the start; everything else negotiates
            Err(_) if port == 465 => SmtpSecurity::Tls,
            Err(_) => SmtpSecurity::StartTls,
        };

        let smtp = SmtpConfig {
            host,
            port,
            security,
            username: non_empty_var("EMAIL_USER"),
            password: non_empty_var("EMAIL_PASSWORD").map(SecretString::from),
        };

        let mail = MailConfig {
            from_address: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| defaults::DEV_MAIL_ADDRESS.to_string()),
            from_name: env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| defaults::FROM_NAME.to_string()),
            to: split_list(
                &env::var("EMAIL_TO").unwrap_or_else(|_| defaults::DEV_MAIL_ADDRESS.to_string()),
            ),
            subject: env::var("EMAIL_SUBJECT").unwrap_or_else(|_| defaults::SUBJECT.to_string()),
        };

        if mail.to.is_empty() {
            return Err(ConfigError::InvalidValue(
                "EMAIL_TO must contain at least one address",
            ));
        }

        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| defaults::DEV_API_BASE_URL.to_string());
        let report_url = env::var("REPORT_URL").unwrap_or_else(|_| api_base_url.clone());

        let fetch_timeout_secs = env::var("REPORT_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::FETCH_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("REPORT_FETCH_TIMEOUT_SECS must be a valid number")
            })?;

        let report_source = ReportSourceConfig {
            api_base_url,
            report_url,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
        };

        let project_ids = match env::var("REPORT_PROJECT_IDS") {
            Ok(value) => split_list(&value),
            Err(_) => default_project_ids(),
        };

        let config = Config {
            environment,
            smtp,
            mail,
            report_source,
            dashboard_url: non_empty_var("DASHBOARD_URL"),
            project_ids,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.smtp.host == defaults::DEV_SMTP_HOST {
            errors.push(format!(
                "EMAIL_HOST is using development default '{}'. Set a production SMTP host.",
                defaults::DEV_SMTP_HOST
            ));
        }

        if self.smtp.security == SmtpSecurity::None {
            errors.push("EMAIL_SECURITY=none is not allowed in production.".to_string());
        }

        if self.mail.from_address == defaults::DEV_MAIL_ADDRESS
            || self.mail.to.iter().any(|to| to == defaults::DEV_MAIL_ADDRESS)
        {
            errors.push(format!(
                "EMAIL_FROM/EMAIL_TO are using development default '{}'. Set real addresses.",
                defaults::DEV_MAIL_ADDRESS
            ));
        }

        if self.report_source.api_base_url == defaults::DEV_API_BASE_URL {
            errors.push(format!(
                "API_BASE_URL is using development default '{}'. Set the reporting API URL.",
                defaults::DEV_API_BASE_URL
            ));
        }

        if self.project_ids.is_empty() {
            errors.push("REPORT_PROJECT_IDS must contain at least one project id.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Built-in project identifiers as owned strings.
pub fn default_project_ids() -> Vec<String> {
    defaults::PROJECT_IDS.iter().map(|id| id.to_string()).collect()
}

/// Split a comma-separated value, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
