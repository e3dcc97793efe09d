use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::platform::{ImageStore, PlatformError, ProductStore};
use crate::types::{AccessToken, ImageUpload, Product, ProductId};
use crate::validation::{validate_new_product, validate_product_patch, FieldErrors, ProductForm};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid product fields")]
    Validation(FieldErrors),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image upload failed: {0}")]
    Upload(#[source] PlatformError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Catalog reads for the storefront and writes for the admin panel
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    images: Arc<dyn ImageStore>,
    max_image_bytes: usize,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, images: Arc<dyn ImageStore>, max_image_bytes: usize) -> Self {
        Self {
            products,
            images,
            max_image_bytes,
        }
    }

    /// All products, newest first. Faults are logged and yield an empty list.
    pub async fn list_products(&self) -> Vec<Product> {
        match self.products.list().await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!("Error fetching products: {}", e);
                Vec::new()
            }
        }
    }

    /// One product, or `None` when it does not exist or the store failed
    pub async fn get_product_by_id(&self, id: &str) -> Option<Product> {
        let id = ProductId::new(id);
        match self.products.get(&id).await {
            Ok(product) => product,
            Err(e) => {
                tracing::error!("Error fetching product {}: {}", id, e);
                None
            }
        }
    }

    pub async fn create_product(
        &self,
        token: &AccessToken,
        form: &ProductForm,
        image: Option<ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let mut product = validate_new_product(form).map_err(CatalogError::Validation)?;

        if let Some(image) = image {
            product.image_url = Some(self.upload_image(token, &image).await?);
        }

        let created = self.products.insert(token, &product).await?;
        tracing::info!("Created product {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Apply the submitted subset of fields. Without a new image the stored
    /// `image_url` is left as it is.
    pub async fn update_product(
        &self,
        token: &AccessToken,
        id: &str,
        form: &ProductForm,
        image: Option<ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let id = ProductId::new(id);
        let mut patch = validate_product_patch(form).map_err(CatalogError::Validation)?;

        if let Some(image) = image {
            patch.image_url = Some(Some(self.upload_image(token, &image).await?));
        }

        if patch.is_empty() {
            return self
                .products
                .get(&id)
                .await?
                .ok_or_else(|| PlatformError::NotFound(format!("product {}", id)).into());
        }

        let updated = self.products.update(token, &id, &patch).await?;
        tracing::info!("Updated product {}", updated.id);
        Ok(updated)
    }

    /// Remove the row. The stored image, if any, is left in the bucket.
    pub async fn delete_product(&self, token: &AccessToken, id: &str) -> Result<(), CatalogError> {
        let id = ProductId::new(id);
        self.products.delete(token, &id).await?;
        tracing::info!("Deleted product {}", id);
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), PlatformError> {
        self.products.ping().await
    }

    async fn upload_image(&self, token: &AccessToken, image: &ImageUpload) -> Result<String, CatalogError> {
        if !image.content_type.starts_with("image/") {
            return Err(CatalogError::InvalidImage(format!(
                "unsupported content type '{}'",
                image.content_type
            )));
        }
        if image.bytes.is_empty() {
            return Err(CatalogError::InvalidImage("file is empty".to_string()));
        }
        if image.bytes.len() > self.max_image_bytes {
            return Err(CatalogError::InvalidImage(format!(
                "file exceeds {} bytes",
                self.max_image_bytes
            )));
        }

        let object_name = object_name_for(&image.file_name);
        self.images
            .upload(token, &object_name, image)
            .await
            .map_err(CatalogError::Upload)
    }
}

/// Random, collision-resistant object name keeping the original extension
pub fn object_name_for(file_name: &str) -> String {
    let stem = format!("{}-{}", Uuid::new_v4().simple(), Utc::now().timestamp_millis());
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}
