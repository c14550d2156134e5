//! Category API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    Category, CategoryFields, CreateCategoryRequest, DeleteCategoryQuery, UpdateCategoryRequest,
};
use crate::AppState;

/// Identifier the next create would claim.
#[derive(Debug, Serialize)]
pub struct NextCategoryId {
    pub id: String,
}

/// Normalize caller fields and reject a blank name.
pub fn validate_fields(fields: CategoryFields) -> Result<CategoryFields, AppError> {
    let fields = fields.normalized();
    if fields.name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    Ok(fields)
}

/// Reject writes that do not name the revision they were based on.
pub fn require_revision(revision: &str) -> Result<&str, AppError> {
    let revision = revision.trim();
    if revision.is_empty() {
        return Err(AppError::Validation("Revision is required".to_string()));
    }
    Ok(revision)
}

/// Reject updates that would blank the stored creation time.
pub fn require_created_at(created_at: &str) -> Result<&str, AppError> {
    let created_at = created_at.trim();
    if created_at.is_empty() {
        return Err(AppError::Validation("createdAt is required".to_string()));
    }
    Ok(created_at)
}

/// GET /api/categories - List all categories.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    success(state.categories.list().await?)
}

/// GET /api/categories/next-id - Preview the next category id.
pub async fn next_category_id(State(state): State<AppState>) -> ApiResult<NextCategoryId> {
    let id = state.categories.next_id().await?;
    success(NextCategoryId { id })
}

/// GET /api/categories/{id} - Get a single category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    success(state.categories.get(&id).await?)
}

/// POST /api/categories - Create a new category.
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(request) = payload?;
    let fields = validate_fields(request)?;
    success(state.categories.create(fields).await?)
}

/// PUT /api/categories/{id} - Update a category at a known revision.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(request) = payload?;
    let revision = require_revision(&request.revision)?;
    let created_at = require_created_at(&request.created_at)?;
    let fields = validate_fields(request.fields)?;

    let category = state
        .categories
        .update(&id, revision, created_at, fields)
        .await?;
    success(category)
}

/// DELETE /api/categories/{id}?rev= - Delete a category at a known revision.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteCategoryQuery>,
) -> ApiResult<()> {
    let revision = require_revision(&query.rev)?;
    state.categories.delete(&id, revision).await?;
    success(())
}
