//! Caller identity derived from the launch data `user` field.

use serde::{Deserialize, Serialize};

/// The `user` object Telegram embeds in launch data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Who is calling, in the same shape the client stores as a post or review author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub username: Option<String>,
}

impl From<TelegramUser> for Identity {
    fn from(user: TelegramUser) -> Self {
        let name = match user.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", user.first_name, last),
            _ => user.first_name,
        };

        Self {
            id: user.id,
            name,
            username: user.username,
        }
    }
}

/// Result of authenticating a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub identity: Option<Identity>,
    pub is_admin: bool,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Classify an identity against the configured administrator id.
    pub fn identified(identity: Identity, admin_id: Option<i64>) -> Self {
        let is_admin = admin_id == Some(identity.id);
        Self {
            identity: Some(identity),
            is_admin,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|i| i.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, last_name: Option<&str>) -> TelegramUser {
        TelegramUser {
            id,
            first_name: "Stefan".to_string(),
            last_name: last_name.map(str::to_string),
            username: Some("stefan".to_string()),
            language_code: None,
            is_premium: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_identity_name_joins_last_name() {
        let identity = Identity::from(user(1, Some("Budimir")));
        assert_eq!(identity.name, "Stefan Budimir");
        assert_eq!(identity.username.as_deref(), Some("stefan"));
    }

    #[test]
    fn test_identity_name_without_last_name() {
        assert_eq!(Identity::from(user(1, None)).name, "Stefan");
        assert_eq!(Identity::from(user(1, Some(" "))).name, "Stefan");
    }

    #[test]
    fn test_admin_flag_requires_exact_id() {
        let admin = Caller::identified(Identity::from(user(42, None)), Some(42));
        assert!(admin.is_admin);

        let other = Caller::identified(Identity::from(user(43, None)), Some(42));
        assert!(!other.is_admin);

        for id in [0, -1, -42] {
            let caller = Caller::identified(Identity::from(user(id, None)), Some(42));
            assert!(!caller.is_admin);
        }

        let nobody = Caller::identified(Identity::from(user(0, None)), None);
        assert!(!nobody.is_admin);
    }

    #[test]
    fn test_user_payload_from_telegram() {
        let user: TelegramUser = serde_json::from_str(
            r#"{"id":279058397,"first_name":"Vladislav","last_name":"","username":"vdkfrost","language_code":"ru","is_premium":true,"allows_write_to_pm":true}"#,
        )
        .unwrap();
        assert_eq!(user.id, 279058397);
        assert_eq!(user.is_premium, Some(true));
        assert_eq!(Identity::from(user).name, "Vladislav");
    }
}
