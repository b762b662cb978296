//! Unverified JWT claim inspection.
//!
//! The signature is the gateway's business; the client only peeks at the
//! payload to learn the expiry horizon and the role.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use base64::Engine;
use serde::Deserialize;

/// Claims issued by the kuvasz backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a compact JWT. `None` for opaque tokens.
    pub fn decode(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let bytes = B64URL.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Seconds left before `exp`, relative to `now_unix`.
    pub fn remaining_secs(&self, now_unix: i64) -> Option<u64> {
        self.exp
            .map(|exp| u64::try_from(exp.saturating_sub(now_unix)).unwrap_or(0))
    }
}

#[cfg(test)]
pub(crate) fn encode_unsigned(claims: &serde_json::Value) -> String {
    let header = B64URL.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = B64URL.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
