// handlers/public/site.rs - GET /api/site

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::site::SiteInfo;
use crate::state::AppState;

/// Site constants plus the structured data every storefront page embeds
pub async fn site_get(State(state): State<AppState>) -> ApiResult<Value> {
    let site: &SiteInfo = &state.site;

    Ok(ApiResponse::success(json!({
        "site": site,
        "schemas": {
            "organization": site.organization_schema(),
            "website": site.website_schema(),
            "local_business": site.local_business_schema(),
        }
    })))
}
