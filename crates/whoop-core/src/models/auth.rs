//! Token endpoint response.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: TokenUser,
}

#[derive(Debug, Deserialize)]
pub struct TokenUser {
    pub id: i64,
    pub profile: TokenUserProfile,
}

#[derive(Debug, Deserialize)]
pub struct TokenUserProfile {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let json = r#"{
            "access_token": "abc123",
            "expires_in": 86400,
            "user": {"id": 42, "profile": {"createdAt": "2019-06-01T14:03:22.000Z", "timezoneOffset": "-0500"}}
        }"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc123");
        assert_eq!(resp.user.id, 42);
        assert_eq!(resp.user.profile.created_at.to_rfc3339(), "2019-06-01T14:03:22+00:00");
    }

    #[test]
    fn test_missing_user_id() {
        let json = r#"{"access_token": "abc", "user": {"profile": {"createdAt": "2019-06-01T00:00:00Z"}}}"#;
        let err = serde_json::from_str::<TokenResponse>(json).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }
}
