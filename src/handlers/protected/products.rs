// handlers/protected/products.rs - admin product management
//
// Write bodies are multipart/form-data: text parts for the product fields and
// an optional `image` file part.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Extension,
};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::{ImageUpload, Product};
use crate::validation::ProductForm;

const IMAGE_FIELD: &str = "image";

/// GET /api/admin/products
pub async fn admin_products_list(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(ApiResponse::success(state.catalog.list_products().await))
}

/// POST /api/admin/products
pub async fn admin_product_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Product> {
    let (form, image) = read_product_form(multipart).await?;
    let product = state
        .catalog
        .create_product(&user.access_token, &form, image)
        .await?;
    Ok(ApiResponse::created(product))
}

/// PATCH /api/admin/products/:id
///
/// Absent parts leave the stored value untouched; an empty text part clears a
/// nullable field. Without an `image` part the current image is kept.
pub async fn admin_product_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Product> {
    let (form, image) = read_product_form(multipart).await?;
    let product = state
        .catalog
        .update_product(&user.access_token, &id, &form, image)
        .await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/admin/products/:id
pub async fn admin_product_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.catalog.delete_product(&user.access_token, &id).await?;
    Ok(ApiResponse::no_content())
}

async fn read_product_form(mut multipart: Multipart) -> Result<(ProductForm, Option<ImageUpload>), ApiError> {
    let mut form = ProductForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part when no file was picked
            if bytes.is_empty() && file_name.is_empty() {
                continue;
            }

            image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        if !form.set(&name, value) {
            tracing::debug!("Ignoring unknown form field '{}'", name);
        }
    }

    Ok((form, image))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body is too large")
    } else {
        ApiError::bad_request(format!("Invalid form data: {}", err.body_text()))
    }
}
