//! The credentials a storefront visitor holds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Durable key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Durable key holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";
/// Durable key holding the user id on its own.
pub const USER_ID_KEY: &str = "userId";

/// The signed-in user as the backend describes it.
///
/// The shape is owned by the backend, so it is kept as an open JSON object.
pub type UserRecord = Map<String, Value>;

/// Token and user record as read from durable storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub token: Option<String>,
    pub user: Option<UserRecord>,
}

impl Identity {
    /// Build an identity from the raw stored strings.
    ///
    /// A blank token counts as absent. A user that is not a JSON object, or
    /// is an empty object, counts as absent.
    pub fn from_stored(token: Option<String>, user: Option<&str>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let user = user.and_then(parse_user);
        Self { token, user }
    }

    /// True iff a token is present and the user record is non-empty.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// The `id` field of the user record, rendered as a string.
    pub fn record_user_id(&self) -> Option<String> {
        self.user.as_ref().and_then(user_id_of)
    }
}

/// Parse a stored user record. Anything but a non-empty object is `None`.
pub fn parse_user(raw: &str) -> Option<UserRecord> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "stored user record is not valid JSON");
            None
        }
    }
}

/// The `id` field of a user record, as a string.
pub fn user_id_of(user: &UserRecord) -> Option<String> {
    match user.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_user_object_is_unauthenticated() {
        let identity = Identity::from_stored(Some("tok".into()), Some("{}"));
        assert_eq!(identity.user, None);
        assert!(!identity.is_authenticated());
    }

    #[test]
    fn test_token_and_user_authenticate() {
        let identity = Identity::from_stored(Some("tok".into()), Some(r#"{"id": 42}"#));
        assert!(identity.is_authenticated());
        assert_eq!(identity.record_user_id().as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_pieces() {
        assert!(!Identity::from_stored(None, Some(r#"{"id": 1}"#)).is_authenticated());
        assert!(!Identity::from_stored(Some("  ".into()), Some(r#"{"id": 1}"#)).is_authenticated());
        assert!(!Identity::from_stored(Some("tok".into()), None).is_authenticated());
    }

    #[test]
    fn test_unparseable_user_is_absent() {
        assert_eq!(parse_user("{not json"), None);
        assert_eq!(parse_user("null"), None);
        assert_eq!(parse_user("[1]"), None);
        assert_eq!(parse_user("\"name\""), None);
    }

    #[test]
    fn test_user_id_of_string_and_number() {
        let user = parse_user(r#"{"id": "u-7"}"#).unwrap();
        assert_eq!(user_id_of(&user).as_deref(), Some("u-7"));

        let user = parse_user(r#"{"name": "no id"}"#).unwrap();
        assert_eq!(user_id_of(&user), None);
    }
}
