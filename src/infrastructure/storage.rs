use crate::domain::errors::StorefrontError;
use crate::domain::ports::ImageStore;

use super::client::RestClient;

/// Object uploads into the public plant-images bucket.
pub struct RestImageStore {
    client: RestClient,
    bucket: String,
}

impl RestImageStore {
    pub const DEFAULT_BUCKET: &'static str = "plant-images";

    pub fn new(client: RestClient) -> Self {
        Self::with_bucket(client, Self::DEFAULT_BUCKET)
    }

    pub fn with_bucket(client: RestClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Publicly resolvable URL for an uploaded key.
    pub fn public_url(&self, key: &str) -> String {
        self.client
            .endpoint(&format!("storage/v1/object/public/{}/{}", self.bucket, key))
    }
}

impl ImageStore for RestImageStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorefrontError> {
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}/{}", self.bucket, key));
        let response = self
            .client
            .http()
            .post(&url)
            .header("apikey", self.client.api_key())
            .bearer_auth(self.client.api_key())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::RemoteRequestFailed(format!(
                "{status} uploading {key}: {body}"
            )));
        }
        Ok(self.public_url(key))
    }
}
