//! Pass-through endpoints for the collector's auxiliary tools.

use axum::extract::{Query, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Acknowledgement, ParseLinkQuery, ParsedLink};
use crate::AppState;

/// GET /api/links/parse?url= - Resolve a storefront link to its product group.
pub async fn parse_link(
    State(state): State<AppState>,
    Query(query): Query<ParseLinkQuery>,
) -> ApiResult<ParsedLink> {
    let url = query.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url is required".to_string()));
    }

    let product_group_id = state.links.parse_link(url).await?;
    tracing::info!("Link {} resolved to product group {}", url, product_group_id);

    success(ParsedLink {
        url: url.to_string(),
        product_group_id,
    })
}

/// POST /api/excel/import - Import the staged spreadsheet.
pub async fn import_excel(State(state): State<AppState>) -> ApiResult<Acknowledgement> {
    state.importer.parse_excel_and_insert().await?;
    success(Acknowledgement {
        message: "Excel import finished".to_string(),
    })
}

/// POST /api/products/update - Refresh stored products.
pub async fn update_products(State(state): State<AppState>) -> ApiResult<Acknowledgement> {
    state.updater.init_updater().await?;
    success(Acknowledgement {
        message: "Product update finished".to_string(),
    })
}
