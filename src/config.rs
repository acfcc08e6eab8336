use crate::locale::Locale;
use crate::query::PAGE_SIZES;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// JSON snapshot of the order API's list response.
    #[serde(default = "default_orders_path")]
    pub orders_path: String,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_orders_path() -> String {
    "orders.json".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_page_size() -> usize {
    crate::query::DEFAULT_PAGE_SIZE
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            orders_path: default_orders_path(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            default_page_size: default_page_size(),
        }
    }
}

impl DisplayConfig {
    /// The configured locale, falling back to `en-US` if it is not supported.
    pub fn locale(&self) -> Locale {
        self.locale.parse().unwrap_or_default()
    }
}

/// Load configuration from config.toml and environment variables
pub fn load() -> Result<Config, figment::Error> {
    Figment::new()
        .merge(Toml::file("config.toml"))
        // Use double-underscore nesting for snake_case keys
        .merge(Env::prefixed("ORDERDESK_").split("__"))
        .extract()
}

/// Validate configuration and return a user-friendly error
pub fn validate(config: &Config) -> Result<(), String> {
    if config.web.port == 0 {
        return Err("web.port must be greater than 0".into());
    }

    if config.source.orders_path.trim().is_empty() {
        return Err("source.orders_path is required".into());
    }

    if let Err(err) = config.display.locale.parse::<Locale>() {
        return Err(format!("display.locale: {err}"));
    }

    if !PAGE_SIZES.contains(&config.display.default_page_size) {
        return Err(format!(
            "display.default_page_size must be one of {PAGE_SIZES:?}"
        ));
    }

    Ok(())
}
