//! Configuration module for the Mini App backend.
//!
//! All configuration is loaded from environment variables with sensible defaults
//! and frozen into a single [`Config`] value at startup.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

/// Default base URL of the JSONBin v3 API.
pub const DEFAULT_STORE_URL: &str = "https://api.jsonbin.io/v3";
/// Default document (bin) id.
pub const DEFAULT_BIN_ID: &str = "69a06fc543b1c97be9a0c7fd";
/// Default TON wallet that receives donations.
pub const DEFAULT_TON_ADDRESS: &str = "UQBX5kKdfM_OnE3H-HWkgYEIi1AO_xOtJL3_6NK65KQykpWc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("MINIAPP_BOT_TOKEN must be set when writes are restricted to the administrator")]
    MissingBotToken,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token shared with Telegram, used to verify launch data
    pub bot_token: Option<String>,
    /// Telegram user id of the administrator
    pub admin_id: Option<i64>,
    /// Base URL of the document store API
    pub store_url: String,
    /// Id of the document holding the record
    pub bin_id: String,
    /// Access key sent as `X-Access-Key`
    pub store_access_key: Option<String>,
    /// Donation destination shown by the client
    pub ton_address: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Only the administrator may overwrite the record
    pub require_admin_for_write: bool,
    /// Reject writes that do not carry an `If-Match` revision
    pub require_revision: bool,
    /// Maximum accepted age of `auth_date`, in seconds
    pub auth_max_age_secs: Option<i64>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("MINIAPP_BOT_TOKEN");
        let admin_id: Option<i64> = parse_optional(&var, "MINIAPP_ADMIN_ID")?;

        let store_url = var("MINIAPP_STORE_URL")
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let bin_id = var("MINIAPP_STORE_BIN_ID").unwrap_or_else(|| DEFAULT_BIN_ID.to_string());
        let store_access_key = var("MINIAPP_STORE_ACCESS_KEY");

        let ton_address =
            var("MINIAPP_TON_ADDRESS").unwrap_or_else(|| DEFAULT_TON_ADDRESS.to_string());

        let bind_addr: SocketAddr = parse_optional(&var, "MINIAPP_BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3001)));

        let require_admin_for_write =
            parse_flag(&var, "MINIAPP_REQUIRE_ADMIN_FOR_WRITE")?.unwrap_or(true);
        let require_revision = parse_flag(&var, "MINIAPP_REQUIRE_REVISION")?.unwrap_or(false);

        let auth_max_age_secs: Option<i64> = parse_optional(&var, "MINIAPP_AUTH_MAX_AGE_SECS")?;
        if matches!(auth_max_age_secs, Some(age) if age <= 0) {
            return Err(ConfigError::Invalid {
                key: "MINIAPP_AUTH_MAX_AGE_SECS",
                message: "must be a positive number of seconds".to_string(),
            });
        }

        let log_level = var("MINIAPP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = parse_flag(&var, "MINIAPP_LOG_JSON")?.unwrap_or(false);

        if require_admin_for_write && bot_token.is_none() {
            return Err(ConfigError::MissingBotToken);
        }

        Ok(Self {
            bot_token,
            admin_id,
            store_url,
            bin_id,
            store_access_key,
            ton_address,
            bind_addr,
            require_admin_for_write,
            require_revision,
            auth_max_age_secs,
            log_level,
            log_json,
        })
    }

    /// Full URL of the record document.
    pub fn record_url(&self) -> String {
        format!("{}/b/{}", self.store_url, self.bin_id)
    }
}

fn parse_optional<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_flag<F>(var: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid {
                key,
                message: format!("expected a boolean, got {other:?}"),
            }),
        })
        .transpose()
}
