//! Auth gateway wire types.

use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Token payload returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    /// Validity window in seconds. The kuvasz backend omits it.
    #[serde(
        rename = "tokenExpiry",
        deserialize_with = "deserialize_u64_option",
        default
    )]
    pub token_expiry: Option<u64>,
}

impl TokenGrant {
    pub fn new(token: impl Into<String>, token_expiry: Option<u64>) -> Self {
        Self {
            token: token.into(),
            token_expiry,
        }
    }
}

/// Outcome of one refresh round-trip that reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshResponse {
    Granted(TokenGrant),
    /// Any non-success status; the renewal cookie is gone or expired.
    Rejected(u16),
}

/// Deserialize optional second counts encoded as string/number/null.
fn deserialize_u64_option<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(num) => num
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("tokenExpiry must be a positive integer"))
            .map(Some),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid tokenExpiry: {err}"))),
        _ => Err(serde::de::Error::custom(
            "tokenExpiry must be string, number, or null",
        )),
    }
}
