//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_BOT_TOKEN` - Bot API token
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `CATALOG_PATH` - JSON catalog file (default: built-in coffee menu)
//! - `CLEAR_CART_ON_CHECKOUT` - Empty the cart after an order is placed (default: false)
//! - `DISPLAY_UTC_OFFSET` - Offset for order timestamps, e.g. `+03:00` (default: +00:00)
//! - `DEFAULT_LANGUAGE` - `en` or `ru` (default: en)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//!
//! # Catalog File
//!
//! `CATALOG_PATH` points to a JSON array of items. Prices are whole roubles.
//! `image` is optional; a relative path is resolved against the catalog file's
//! directory, and an item whose image is missing is shown as text.
//!
//! ```json
//! [
//!   {"id": "espresso", "name": "Espresso", "description": "Short and strong", "unit_price": 150,
//!    "image": "photos/espresso.jpg"},
//!   {"id": "latte", "name": "Latte", "description": "Espresso with steamed milk", "unit_price": 200}
//! ]
//! ```
//!
//! The built-in menu carries no images.

use chrono::FixedOffset;
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::localization::get_localization_manager;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Bot configuration.
///
/// Implements `Debug` manually to redact the token and the database URL.
#[derive(Clone)]
pub struct BotConfig {
    pub telegram_bot_token: String,
    /// Connection URL, may contain a password
    pub database_url: String,
    pub database_max_connections: u32,
    pub catalog_path: Option<PathBuf>,
    pub clear_cart_on_checkout: bool,
    pub display_utc_offset: FixedOffset,
    /// Language for users whose Telegram language is not supported
    pub default_language: String,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_bot_token", &"[REDACTED]")
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("catalog_path", &self.catalog_path)
            .field("clear_cart_on_checkout", &self.clear_cart_on_checkout)
            .field("display_utc_offset", &self.display_utc_offset)
            .field("default_language", &self.default_language)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let get_required = |name: &str| {
            get_optional(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let telegram_bot_token = get_required("TELEGRAM_BOT_TOKEN")?;
        let database_url = get_required("DATABASE_URL")?;

        let database_max_connections = match get_optional("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(invalid("DATABASE_MAX_CONNECTIONS", "must be positive")),
                Err(e) => return Err(invalid("DATABASE_MAX_CONNECTIONS", e)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let catalog_path = get_optional("CATALOG_PATH").map(PathBuf::from);

        let clear_cart_on_checkout = match get_optional("CLEAR_CART_ON_CHECKOUT") {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| invalid("CLEAR_CART_ON_CHECKOUT", "expected true or false"))?,
            None => false,
        };

        let display_utc_offset = match get_optional("DISPLAY_UTC_OFFSET") {
            Some(value) => value
                .parse::<FixedOffset>()
                .map_err(|e| invalid("DISPLAY_UTC_OFFSET", e))?,
            None => FixedOffset::east_opt(0).ok_or_else(|| invalid("DISPLAY_UTC_OFFSET", "UTC"))?,
        };

        let default_language = match get_optional("DEFAULT_LANGUAGE") {
            Some(value) => {
                let language = value.to_lowercase();
                if !get_localization_manager().is_language_supported(&language) {
                    return Err(invalid("DEFAULT_LANGUAGE", "unsupported language"));
                }
                language
            }
            None => crate::localization::DEFAULT_LANGUAGE.to_string(),
        };

        let log_format = match get_optional("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(invalid("LOG_FORMAT", "expected text or json")),
        };

        Ok(Self {
            telegram_bot_token,
            database_url,
            database_max_connections,
            catalog_path,
            clear_cart_on_checkout,
            display_utc_offset,
            default_language,
            log_format,
        })
    }

    /// Load the catalog file if one is configured, else the built-in menu
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_json_file(path),
            None => Ok(Catalog::coffee_menu()),
        }
    }
}

fn invalid(name: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(name.to_string(), reason.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
