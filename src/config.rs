//! Runtime settings from the environment. A `.env` file is honored by the binary.

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Page size used when a list request has no `limit`, and the ceiling requests are clamped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_body_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub page_limits: PageLimits,
    pub max_connections: u32,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: v.clone(),
            })?,
            None => LogFormat::Text,
        };

        let page_limits = PageLimits {
            default_limit: parse_or(get("DEFAULT_PAGE_LIMIT"), "DEFAULT_PAGE_LIMIT", 10)?,
            max_limit: parse_or(get("MAX_PAGE_LIMIT"), "MAX_PAGE_LIMIT", 100)?,
        };
        if page_limits.max_limit <= 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_LIMIT",
                value: page_limits.max_limit.to_string(),
            });
        }
        if page_limits.default_limit <= 0 || page_limits.default_limit > page_limits.max_limit {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_PAGE_LIMIT",
                value: page_limits.default_limit.to_string(),
            });
        }

        Ok(AppConfig {
            database_url: get("DATABASE_URL"),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("PORT"), "PORT", 8080)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_format,
            max_body_bytes: parse_or(get("MAX_REQUEST_BODY_BYTES"), "MAX_REQUEST_BODY_BYTES", 1_048_576)?,
            cors_allowed_origins: parse_allowed_origins(get("CORS_ALLOWED_ORIGINS").as_deref().unwrap_or("")),
            page_limits,
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5)?,
            request_timeout: Duration::from_secs(parse_or(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 60)?),
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

/// Comma-separated origins; empty input falls back to the local dev origin.
pub fn parse_allowed_origins(origins: &str) -> Vec<String> {
    let parsed: Vec<String> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    if parsed.is_empty() {
        vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
    } else {
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = config(&[]).unwrap();
        assert_eq!(c.addr(), "0.0.0.0:8080");
        assert_eq!(c.log_format, LogFormat::Text);
        assert_eq!(c.max_body_bytes, 1_048_576);
        assert_eq!(c.page_limits, PageLimits::default());
        assert_eq!(c.cors_allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);
        assert!(matches!(c.database_url(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let c = config(&[
            ("DATABASE_URL", " postgres://localhost/catalog "),
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
            ("MAX_PAGE_LIMIT", "50"),
            ("DEFAULT_PAGE_LIMIT", "20"),
        ])
        .unwrap();
        assert_eq!(c.database_url().unwrap(), "postgres://localhost/catalog");
        assert_eq!(c.port, 9000);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.page_limits, PageLimits { default_limit: 20, max_limit: 50 });
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::Invalid { key: "PORT", .. })));
        assert!(matches!(config(&[("LOG_FORMAT", "xml")]), Err(ConfigError::Invalid { key: "LOG_FORMAT", .. })));
        assert!(matches!(
            config(&[("DEFAULT_PAGE_LIMIT", "500")]),
            Err(ConfigError::Invalid { key: "DEFAULT_PAGE_LIMIT", .. })
        ));
        assert!(matches!(config(&[("MAX_PAGE_LIMIT", "0")]), Err(ConfigError::Invalid { key: "MAX_PAGE_LIMIT", .. })));
    }

    #[test]
    fn allowed_origins_are_split_and_trimmed() {
        assert_eq!(
            parse_allowed_origins("https://a.example, https://b.example ,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(parse_allowed_origins("  "), vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);
    }
}
