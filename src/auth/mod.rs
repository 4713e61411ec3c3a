//! Launch data authentication.
//!
//! Every API request may carry `Authorization: Bearer <initData>`. Requests
//! without it are anonymous; requests with it must carry a valid signature or
//! they are refused before reaching a handler.

pub mod launch_data;

pub use launch_data::LaunchDataError;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Caller, Identity};
use launch_data::SecretKey;

/// Prefix of the authorization header value carrying launch data.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Classifies callers from their launch data.
#[derive(Debug, Clone)]
pub struct AuthGate {
    secret: Option<SecretKey>,
    admin_id: Option<i64>,
    max_age_secs: Option<i64>,
}

impl AuthGate {
    pub fn new(bot_token: Option<&str>, admin_id: Option<i64>, max_age_secs: Option<i64>) -> Self {
        Self {
            secret: bot_token.map(SecretKey::derive),
            admin_id,
            max_age_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.bot_token.as_deref(),
            config.admin_id,
            config.auth_max_age_secs,
        )
    }

    /// Classify a request from its `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Caller, LaunchDataError> {
        let Some(token) = authorization.and_then(|v| v.strip_prefix(BEARER_PREFIX)) else {
            return Ok(Caller::anonymous());
        };

        self.authenticate_token(token, Utc::now().timestamp())
    }

    /// Classify a bare launch data token at time `now` (unix seconds).
    pub fn authenticate_token(&self, token: &str, now: i64) -> Result<Caller, LaunchDataError> {
        let secret = self.secret.as_ref().ok_or(LaunchDataError::NotConfigured)?;
        let data = launch_data::verify(token, secret)?;

        if let Some(max_age_secs) = self.max_age_secs {
            data.check_freshness(now, max_age_secs)?;
        }

        match data.user() {
            Ok(user) => Ok(Caller::identified(Identity::from(user), self.admin_id)),
            Err(e) => {
                tracing::warn!("Proceeding without identity: {}", e);
                Ok(Caller::anonymous())
            }
        }
    }
}

/// Authentication layer: attaches the [`Caller`] to the request or refuses it.
pub async fn launch_auth_layer(gate: AuthGate, mut request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match gate.authenticate(authorization) {
        Ok(caller) => {
            match caller.user_id() {
                Some(id) => tracing::debug!("Caller {} (admin: {})", id, caller.is_admin),
                None => tracing::debug!("Anonymous caller"),
            }
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::launch_data::tests::signed_token;
    use super::*;

    const BOT_TOKEN: &str = "7000000000:test-bot-token";
    const ADMIN_ID: i64 = 800391069;

    fn gate() -> AuthGate {
        AuthGate::new(Some(BOT_TOKEN), Some(ADMIN_ID), None)
    }

    fn user_json(id: i64) -> String {
        format!(r#"{{"id":{id},"first_name":"Stefan","last_name":"Budimir","username":"stefan"}}"#)
    }

    #[test]
    fn test_no_header_is_anonymous() {
        assert_eq!(gate().authenticate(None), Ok(Caller::anonymous()));
    }

    #[test]
    fn test_non_bearer_header_is_anonymous() {
        assert_eq!(
            gate().authenticate(Some("Basic dXNlcjpwYXNz")),
            Ok(Caller::anonymous())
        );
    }

    #[test]
    fn test_empty_bearer_is_invalid() {
        assert_eq!(
            gate().authenticate(Some("Bearer ")),
            Err(LaunchDataError::MissingHash)
        );
    }

    #[test]
    fn test_admin_and_user_classification() {
        let admin = signed_token(BOT_TOKEN, &[("user", user_json(ADMIN_ID).as_str())]);
        let caller = gate()
            .authenticate(Some(&format!("Bearer {admin}")))
            .unwrap();
        assert!(caller.is_admin);
        assert_eq!(caller.identity.unwrap().name, "Stefan Budimir");

        let user = signed_token(BOT_TOKEN, &[("user", user_json(5).as_str())]);
        let caller = gate().authenticate(Some(&format!("Bearer {user}"))).unwrap();
        assert!(!caller.is_admin);
        assert_eq!(caller.user_id(), Some(5));
    }

    #[test]
    fn test_valid_token_without_user_has_no_identity() {
        let token = signed_token(BOT_TOKEN, &[("auth_date", "1700000000")]);
        let caller = gate().authenticate_token(&token, 1700000000).unwrap();
        assert_eq!(caller, Caller::anonymous());

        let token = signed_token(BOT_TOKEN, &[("user", r#"{"first_name":"NoId"}"#)]);
        let caller = gate().authenticate_token(&token, 0).unwrap();
        assert_eq!(caller, Caller::anonymous());
    }

    #[test]
    fn test_tampered_token_is_invalid_not_anonymous() {
        let token = signed_token(BOT_TOKEN, &[("user", user_json(5).as_str())]);
        let forged = token.replace("%3A5%2C", &format!("%3A{ADMIN_ID}%2C"));
        assert_ne!(forged, token);
        assert_eq!(
            gate().authenticate_token(&forged, 0),
            Err(LaunchDataError::SignatureMismatch)
        );
    }

    #[test]
    fn test_unconfigured_gate_refuses_tokens() {
        let gate = AuthGate::new(None, Some(ADMIN_ID), None);
        let token = signed_token("", &[("user", user_json(ADMIN_ID).as_str())]);

        assert_eq!(
            gate.authenticate_token(&token, 0),
            Err(LaunchDataError::NotConfigured)
        );
        assert_eq!(gate.authenticate(None), Ok(Caller::anonymous()));
    }

    #[test]
    fn test_max_age_enforced_when_configured() {
        let gate = AuthGate::new(Some(BOT_TOKEN), Some(ADMIN_ID), Some(3600));
        let token = signed_token(
            BOT_TOKEN,
            &[("auth_date", "1700000000"), ("user", user_json(ADMIN_ID).as_str())],
        );

        assert!(gate.authenticate_token(&token, 1700000000 + 60).unwrap().is_admin);
        assert!(matches!(
            gate.authenticate_token(&token, 1700000000 + 7200),
            Err(LaunchDataError::Expired { .. })
        ));
    }
}
