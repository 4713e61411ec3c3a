//! Verification of Telegram Mini App launch data (`initData`).
//!
//! The platform signs the launch parameters with a key derived from the bot
//! token:
//!
//! ```text
//! secret    = HMAC_SHA256(key = "WebAppData", message = bot_token)
//! check     = sorted "key=value" pairs without `hash`, joined by '\n'
//! signature = hex(HMAC_SHA256(key = secret, message = check))
//! ```
//!
//! The launch data is valid when `signature` equals its `hash` field.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::models::TelegramUser;

type HmacSha256 = Hmac<Sha256>;

/// Key of the HMAC that turns a bot token into the launch data secret.
const SECRET_KEY_LABEL: &[u8] = b"WebAppData";

/// Tolerated clock skew for `auth_date` values from the future.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Reasons launch data is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchDataError {
    #[error("launch data has no hash field")]
    MissingHash,

    #[error("launch data has more than one hash field")]
    DuplicateHash,

    #[error("launch data signature does not match")]
    SignatureMismatch,

    #[error("launch data has no usable auth_date")]
    MissingAuthDate,

    #[error("launch data is {age_secs}s old, limit is {max_age_secs}s")]
    Expired { age_secs: i64, max_age_secs: i64 },

    #[error("launch data auth_date lies {0}s in the future")]
    IssuedInFuture(i64),

    #[error("launch data presented but no bot token is configured")]
    NotConfigured,
}

/// The `user` field was missing or unreadable inside otherwise valid launch data.
#[derive(Debug, Error)]
pub enum MalformedIdentity {
    #[error("launch data has no user field")]
    Missing,

    #[error("launch data user field is not valid JSON: {0}")]
    Unparseable(#[from] serde_json::Error),
}

/// Secret derived from the bot token.
#[derive(Clone)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn derive(bot_token: &str) -> Self {
        Self(hmac_sha256(SECRET_KEY_LABEL, bot_token.as_bytes()))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Launch data whose signature has been verified. The `hash` entry is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchData {
    fields: Vec<(String, String)>,
}

impl LaunchData {
    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Unix timestamp the launch data was issued at.
    pub fn auth_date(&self) -> Option<i64> {
        self.get("auth_date")?.trim().parse().ok()
    }

    /// Decode the `user` field.
    pub fn user(&self) -> Result<TelegramUser, MalformedIdentity> {
        let raw = self.get("user").ok_or(MalformedIdentity::Missing)?;
        Ok(serde_json::from_str(raw)?)
    }

    /// Reject launch data issued more than `max_age_secs` before `now`.
    pub fn check_freshness(&self, now: i64, max_age_secs: i64) -> Result<(), LaunchDataError> {
        let issued = self.auth_date().ok_or(LaunchDataError::MissingAuthDate)?;
        let age_secs = now.saturating_sub(issued);

        if age_secs > max_age_secs {
            return Err(LaunchDataError::Expired {
                age_secs,
                max_age_secs,
            });
        }
        if age_secs < -MAX_FUTURE_SKEW_SECS {
            return Err(LaunchDataError::IssuedInFuture(age_secs.saturating_neg()));
        }
        Ok(())
    }
}

/// Split an encoded token into its fields and its `hash`.
pub fn parse(token: &str) -> Result<(Vec<(String, String)>, String), LaunchDataError> {
    let mut hash = None;
    let mut fields = Vec::new();

    for (key, value) in form_urlencoded::parse(token.as_bytes()) {
        if key == "hash" {
            if hash.replace(value.into_owned()).is_some() {
                return Err(LaunchDataError::DuplicateHash);
            }
        } else {
            fields.push((key.into_owned(), value.into_owned()));
        }
    }

    let hash = hash.ok_or(LaunchDataError::MissingHash)?;
    Ok((fields, hash))
}

/// Build the newline separated check string, keys sorted byte-wise.
pub fn data_check_string(fields: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = fields.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase hex signature of a check string.
pub fn sign(secret: &SecretKey, check_string: &str) -> String {
    hex::encode(hmac_sha256(&secret.0, check_string.as_bytes()))
}

/// Verify a token against an already derived secret.
pub fn verify(token: &str, secret: &SecretKey) -> Result<LaunchData, LaunchDataError> {
    let (fields, hash) = parse(token)?;
    let expected = sign(secret, &data_check_string(&fields));

    if !constant_time_eq(expected.as_bytes(), hash.as_bytes()) {
        return Err(LaunchDataError::SignatureMismatch);
    }

    Ok(LaunchData { fields })
}

/// Constant-time byte comparison. Unequal lengths compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}
