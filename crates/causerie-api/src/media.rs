//! Media upload.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use causerie_shared::constants::MAX_UPLOAD_SIZE;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl ApiClient {
    /// Upload a media file and return the URL the backend serves it under.
    ///
    /// The returned URL is what an image message body carries; sending the
    /// message itself is a separate call.
    ///
    /// `POST /upload` (multipart, field name `file`)
    pub async fn upload_media(&self, filename: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::UploadTooLarge {
                size: bytes.len(),
                max: MAX_UPLOAD_SIZE,
            });
        }

        let size = bytes.len();
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let resp: UploadResponse = self
            .send(self.http().post(self.url("/upload")).multipart(form))
            .await?;

        info!(%filename, size, url = %resp.url, "Media uploaded");
        Ok(resp.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_oversized_upload_rejected_locally() {
        let client = ApiClient::new("http://localhost:5000/api", Arc::new(StaticToken::new("t")))
            .unwrap();
        let too_big = vec![0u8; MAX_UPLOAD_SIZE + 1];
        let err = client.upload_media("x.png", too_big).await.unwrap_err();
        assert!(matches!(err, ApiError::UploadTooLarge { .. }));
    }
}
