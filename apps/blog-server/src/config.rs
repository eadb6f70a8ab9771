//! Application configuration loaded from environment variables.

use std::env;

use blogicum_infra::database::DatabaseConfig;
use blogicum_infra::JwtConfig;

#[cfg(feature = "rate-limit")]
use blogicum_infra::RateLimitConfig;

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    /// Staff accounts created at startup when missing.
    pub admin_usernames: Vec<String>,
    /// Initial password of the seeded staff accounts. Nothing is seeded without it.
    pub admin_password: Option<String>,
    /// Key rate limits on `X-Forwarded-For` / `Forwarded` instead of the peer address.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parse_var("DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.max_connections),
                min_connections: parse_var("DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.min_connections),
                ..defaults
            }
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            jwt: JwtConfig::from_env(),
            admin_usernames: env::var("ADMIN_USERNAMES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS").unwrap_or(false),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Split a comma separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" ada, ,grace ,"), vec!["ada", "grace"]);
        assert!(parse_list("").is_empty());
    }
}
