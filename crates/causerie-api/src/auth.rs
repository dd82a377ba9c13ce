//! Credential plumbing and sign-in verification.

use serde::{Deserialize, Serialize};

use causerie_shared::Identity;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// Source of bearer credentials for REST calls.
///
/// Consulted once per request: the identity provider may rotate short-lived
/// tokens between calls, and the client must always send a fresh one.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<String>;
}

/// A fixed token, e.g. supplied through the environment.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(ApiError::Credential("empty auth token".to_string()));
        }
        Ok(self.0.clone())
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    user: Identity,
}

impl ApiClient {
    /// Exchange an identity-provider token for the resolved [`Identity`].
    ///
    /// `POST /auth/verify`
    pub async fn verify(&self, token: &str) -> Result<Identity> {
        let resp: VerifyResponse = self
            .post_json("/auth/verify", &VerifyRequest { token })
            .await?;
        Ok(resp.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.token().unwrap(), "abc");
    }

    #[test]
    fn test_empty_token_rejected() {
        let provider = StaticToken::new("");
        assert!(matches!(provider.token(), Err(ApiError::Credential(_))));
    }
}
