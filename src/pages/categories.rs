//! Category pages: list, create, edit and delete through HTML forms.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::api::{require_created_at, require_revision, validate_fields};
use crate::errors::AppError;
use crate::models::{Category, CategoryFields};
use crate::AppState;

const LIST_PATH: &str = "/categories";

/// Fields posted by the category form.
///
/// Names match the form inputs, which keep the stored document's field names.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub sarga_id: String,
    #[serde(default)]
    pub rev: String,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: String,
}

impl CategoryForm {
    fn fields(&self) -> CategoryFields {
        CategoryFields {
            name: self.name.clone(),
            slug: self.slug.clone(),
            order: self.order.clone(),
            weight: self.weight.clone(),
            parent_id: Some(self.parent_id.clone()),
            external_ref: Some(self.sarga_id.clone()),
        }
    }
}

/// Flat values for filling the form inputs.
#[derive(Debug, Default, Serialize)]
struct FormView {
    id: String,
    rev: String,
    name: String,
    slug: String,
    order: String,
    weight: String,
    parent_id: String,
    sarga_id: String,
    created_at: String,
}

impl From<Category> for FormView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            rev: category.revision,
            name: category.name,
            slug: category.slug,
            order: category.order,
            weight: category.weight,
            parent_id: category.parent_id.unwrap_or_default(),
            sarga_id: category.external_ref.unwrap_or_default(),
            created_at: category.created_at,
        }
    }
}

/// GET /categories
pub async fn category_list_page(State(state): State<AppState>) -> Response {
    state.pages.respond(render_list(&state).await)
}

/// GET /categories/new
pub async fn new_category_page(State(state): State<AppState>) -> Response {
    let page = state.pages.render(
        "category_form.html",
        context! {
            heading => "New category",
            action => LIST_PATH,
            form => FormView::default(),
        },
    );
    state.pages.respond(page.map(IntoResponse::into_response))
}

/// POST /categories
pub async fn create_category_form(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    state.pages.respond(create_from_form(&state, form).await)
}

/// GET /categories/{id}
pub async fn edit_category_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    state.pages.respond(render_edit(&state, &id).await)
}

/// POST /categories/{id}
pub async fn update_category_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Response {
    state.pages.respond(update_from_form(&state, &id, form).await)
}

/// POST /categories/{id}/delete
///
/// Deletes whatever revision is current when the request arrives.
pub async fn delete_category_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    state.pages.respond(delete_current(&state, &id).await)
}

async fn render_list(state: &AppState) -> Result<Response, AppError> {
    let categories = state.categories.list().await?;
    let page = state
        .pages
        .render("categories.html", context! { categories => categories })?;
    Ok(page.into_response())
}

async fn render_edit(state: &AppState, id: &str) -> Result<Response, AppError> {
    let category = state.categories.get(id).await?;
    let page = state.pages.render(
        "category_form.html",
        context! {
            heading => format!("Category {}", category.id),
            action => format!("{}/{}", LIST_PATH, category.id),
            form => FormView::from(category),
        },
    )?;
    Ok(page.into_response())
}

async fn create_from_form(state: &AppState, form: CategoryForm) -> Result<Response, AppError> {
    let fields = validate_fields(form.fields())?;
    state.categories.create(fields).await?;
    Ok(Redirect::to(LIST_PATH).into_response())
}

async fn update_from_form(
    state: &AppState,
    id: &str,
    form: CategoryForm,
) -> Result<Response, AppError> {
    let revision = require_revision(&form.rev)?;
    let created_at = require_created_at(&form.created_at)?;
    let fields = validate_fields(form.fields())?;
    state
        .categories
        .update(id, revision, created_at, fields)
        .await?;
    Ok(Redirect::to(LIST_PATH).into_response())
}

async fn delete_current(state: &AppState, id: &str) -> Result<Response, AppError> {
    let current = state.categories.get(id).await?;
    state.categories.delete(id, &current.revision).await?;
    Ok(Redirect::to(LIST_PATH).into_response())
}
