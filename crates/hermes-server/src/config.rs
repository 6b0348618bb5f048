//! Server configuration for Hermes.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `HERMES_*` environment variables.

use std::net::SocketAddr;

/// Wire-format version advertised to the automation webhook.
pub const API_VERSION: &str = "2024-11";

/// Deployment environment. Selects the webhook URL and the default
/// CAPTCHA score threshold (production is stricter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }

    /// Default minimum CAPTCHA score for this environment.
    #[must_use]
    pub const fn default_captcha_min_score(self) -> f64 {
        match self {
            Self::Production => 0.7,
            Self::Staging | Self::Development => 0.5,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Automation webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Webhook URL used in production.
    pub production_url: String,
    /// Webhook URL used everywhere else.
    pub test_url: String,
    /// Optional secondary channel, POSTed to when the primary relay
    /// fails. Carries priority and message-id fields so the operations
    /// inbox still gets the lead.
    pub fallback_url: Option<String>,
}

impl WebhookConfig {
    /// The primary webhook URL for the given environment.
    #[must_use]
    pub fn url_for(&self, environment: Environment) -> &str {
        match environment {
            Environment::Production => &self.production_url,
            Environment::Staging | Environment::Development => &self.test_url,
        }
    }
}

/// CAPTCHA verification configuration.
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    /// Provider secret. Verification is skipped entirely when unset.
    pub secret: Option<String>,
    /// Provider siteverify endpoint.
    pub verify_url: String,
    /// Minimum acceptable score.
    pub min_score: f64,
}

/// GDPR retention configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    /// Leads older than this many days are purged.
    pub window_days: u32,
    /// Seconds between purge scans.
    pub scan_interval_secs: u64,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Deployment environment.
    pub environment: Environment,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    pub webhook: WebhookConfig,
    pub captcha: CaptchaConfig,
    pub retention: RetentionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (Railway convention, binds to `0.0.0.0`)
    /// - `HERMES_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8080`)
    /// - `DATABASE_URL` — PostgreSQL connection string (default: `postgres://localhost/hermes`)
    /// - `HERMES_ENV` — `production`, `staging`, or `development` (default: `development`)
    /// - `HERMES_LOG_LEVEL` — log filter (default: `info`)
    /// - `HERMES_WEBHOOK_URL` / `HERMES_TEST_WEBHOOK_URL` — automation webhook endpoints
    /// - `HERMES_FALLBACK_WEBHOOK_URL` — secondary channel for failed relays (optional)
    /// - `HERMES_CAPTCHA_SECRET` — provider secret; verification skipped when unset
    /// - `HERMES_CAPTCHA_VERIFY_URL` — provider siteverify endpoint
    /// - `HERMES_CAPTCHA_MIN_SCORE` — score threshold (default per environment)
    /// - `HERMES_RETENTION_DAYS` — GDPR retention window (default: `730`)
    /// - `HERMES_RETENTION_SCAN_INTERVAL` — seconds between purge scans (default: `86400`)
    #[must_use]
    pub fn from_env() -> Self {
        // Priority: HERMES_BIND_ADDR > PORT (Railway) > default 127.0.0.1:8080
        let bind_addr = if let Ok(addr) = std::env::var("HERMES_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)))
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8080);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8080))
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/hermes".to_owned());

        let environment = std::env::var("HERMES_ENV")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Environment::Development);

        let log_level =
            std::env::var("HERMES_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let webhook = WebhookConfig {
            production_url: std::env::var("HERMES_WEBHOOK_URL").unwrap_or_else(|_| {
                "https://automation.hermessecurity.io/webhook/lead-intake".to_owned()
            }),
            test_url: std::env::var("HERMES_TEST_WEBHOOK_URL").unwrap_or_else(|_| {
                "https://automation.hermessecurity.io/webhook-test/lead-intake".to_owned()
            }),
            fallback_url: std::env::var("HERMES_FALLBACK_WEBHOOK_URL").ok(),
        };

        let captcha = CaptchaConfig {
            secret: std::env::var("HERMES_CAPTCHA_SECRET").ok(),
            verify_url: std::env::var("HERMES_CAPTCHA_VERIFY_URL").unwrap_or_else(|_| {
                "https://www.google.com/recaptcha/api/siteverify".to_owned()
            }),
            min_score: std::env::var("HERMES_CAPTCHA_MIN_SCORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| environment.default_captcha_min_score()),
        };

        let retention = RetentionConfig {
            window_days: std::env::var("HERMES_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(730),
            scan_interval_secs: std::env::var("HERMES_RETENTION_SCAN_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
        };

        Self {
            bind_addr,
            database_url,
            environment,
            log_level,
            webhook,
            captcha,
            retention,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn production_threshold_is_stricter() {
        assert!(
            Environment::Production.default_captcha_min_score()
                > Environment::Staging.default_captcha_min_score()
        );
    }

    #[test]
    fn webhook_url_selected_by_environment() {
        let cfg = WebhookConfig {
            production_url: "https://hooks.example.net/live".to_owned(),
            test_url: "https://hooks.example.net/test".to_owned(),
            fallback_url: None,
        };
        assert_eq!(cfg.url_for(Environment::Production), "https://hooks.example.net/live");
        assert_eq!(cfg.url_for(Environment::Staging), "https://hooks.example.net/test");
        assert_eq!(cfg.url_for(Environment::Development), "https://hooks.example.net/test");
    }
}
