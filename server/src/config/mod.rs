use std::env;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_QR_IMAGE_BASE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    pub production: bool,
    pub cors_allowed_origins: Option<String>,
    pub qr_image_base_url: Option<String>,
    pub email_service_url: Option<String>,
    pub email_service_token: Option<String>,
    pub email_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            port: DEFAULT_PORT,
            production: false,
            cors_allowed_origins: None,
            qr_image_base_url: Some(DEFAULT_QR_IMAGE_BASE_URL.to_string()),
            email_service_url: None,
            email_service_token: None,
            email_timeout_secs: DEFAULT_EMAIL_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Unset or blank values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            ),
            port: parse_or("PORT", get("PORT"), defaults.port),
            production: get("RUST_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            // Set but blank disables image URLs.
            qr_image_base_url: match lookup("QR_IMAGE_BASE_URL") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
                None => defaults.qr_image_base_url,
            },
            email_service_url: get("EMAIL_SERVICE_URL"),
            email_service_token: get("EMAIL_SERVICE_TOKEN"),
            email_timeout_secs: parse_or(
                "EMAIL_TIMEOUT_SECS",
                get("EMAIL_TIMEOUT_SECS"),
                defaults.email_timeout_secs,
            ),
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid {} '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
