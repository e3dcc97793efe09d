// handlers/public/products.rs - storefront catalog reads

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::site::{format_price_eur, PageMetadata};
use crate::state::AppState;
use crate::types::Product;

/// Detail page data: metadata, display price and Product structured data
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub formatted_price: String,
    pub metadata: PageMetadata,
    pub schema: Value,
}

/// GET /api/products - all products, newest first
///
/// A backend failure yields an empty list, never an error.
pub async fn products_list(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(ApiResponse::success(state.catalog.list_products().await))
}

/// GET /api/products/:id
pub async fn product_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    state
        .catalog
        .get_product_by_id(&id)
        .await
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Product '{}' not found", id)))
}

/// GET /api/products/:id/metadata
pub async fn product_metadata(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ProductPage> {
    let product = state
        .catalog
        .get_product_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Product '{}' not found", id)))?;

    Ok(ApiResponse::success(ProductPage {
        formatted_price: format_price_eur(product.price),
        metadata: state.site.product_metadata(&product),
        schema: state.site.product_schema(&product),
        product,
    }))
}
