//! Core request plumbing shared by every endpoint module.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use causerie_shared::constants::HTTP_TIMEOUT_SECS;

use crate::auth::TokenProvider;
use crate::error::{ApiError, Result};

/// Authenticated REST client.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Build a client against `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.http.get(self.url(path))).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    pub(crate) async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    /// Attach the bearer credential, send, and decode the JSON response.
    ///
    /// 401/403 map to [`ApiError::Auth`]; other non-success statuses carry
    /// the response body as the error message.
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let token = self.tokens.token()?;
        let resp = req.bearer_auth(token).send().await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            debug!(code = status.as_u16(), %message, "API call failed");
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ApiClient::new(
            "http://localhost:5000/api/",
            Arc::new(StaticToken::new("t")),
        )
        .unwrap();
        assert_eq!(client.url("/chat/list"), "http://localhost:5000/api/chat/list");
    }
}
