use async_trait::async_trait;
use reqwest::{header, Method};

use super::{ImageStore, PlatformError, SupabaseClient};
use crate::types::{AccessToken, ImageUpload};

const SERVICE: &str = "object store";

#[async_trait]
impl ImageStore for SupabaseClient {
    async fn upload(
        &self,
        token: &AccessToken,
        object_name: &str,
        image: &ImageUpload,
    ) -> Result<String, PlatformError> {
        let response = self
            .request(Method::POST, &self.storage_url(object_name), Some(token))
            .header(header::CONTENT_TYPE, &image.content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(image.bytes.clone())
            .send()
            .await?;

        Self::check(SERVICE, response).await?;
        Ok(self.public_object_url(object_name))
    }
}
