//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use agora_core::services::ResetSettings;
use agora_infra::database::DatabaseConfig;
use agora_infra::{JwtConfig, WebhookMailConfig};

/// Where uploaded media is written and how large it may be.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    /// Public prefix of stored media URLs; served by `GET /media/{file}`.
    pub base_url: String,
    pub max_upload_bytes: usize,
}

impl MediaConfig {
    /// JSON body limit: two base64 images plus the rest of the body.
    pub fn json_limit(&self) -> usize {
        self.max_upload_bytes.div_ceil(3) * 4 * 2 + 64 * 1024
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            base_url: "/media".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    /// HTTP mail API; without it mail is only logged.
    pub mail: Option<WebhookMailConfig>,
    pub reset: ResetSettings,
    /// Marks session cookies `Secure`.
    pub production: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            jwt: JwtConfig::default(),
            media: MediaConfig::default(),
            mail: None,
            reset: ResetSettings::default(),
            production: false,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS", 100),
            min_connections: parsed("DB_MIN_CONNECTIONS", 10),
        });

        let media = MediaConfig {
            root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media.root),
            base_url: env::var("MEDIA_BASE_URL").unwrap_or(defaults.media.base_url),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", defaults.media.max_upload_bytes),
        };

        let mail = env::var("MAIL_API_URL").ok().map(|url| WebhookMailConfig {
            url,
            api_key: env::var("MAIL_API_KEY").ok(),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@agora.local".to_string()),
        });

        let reset = ResetSettings {
            link_base: env::var("RESET_LINK_BASE").unwrap_or(defaults.reset.link_base),
            token_ttl: chrono::Duration::minutes(parsed(
                "RESET_TOKEN_TTL_MINUTES",
                defaults.reset.token_ttl.num_minutes(),
            )),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT", defaults.port),
            database,
            jwt: JwtConfig::from_env(),
            media,
            mail,
            reset,
            production: env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false),
        }
    }
}
