//! Server-rendered admin pages.
//!
//! Templates are compiled into the binary and rendered with HTML escaping.

mod categories;

pub use categories::*;

use axum::response::{Html, IntoResponse, Response};
use minijinja::{context, Environment};
use serde::Serialize;

use crate::errors::AppError;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/pages/layout.html")),
    ("categories.html", include_str!("../../templates/pages/categories.html")),
    ("category_form.html", include_str!("../../templates/pages/category_form.html")),
    ("error.html", include_str!("../../templates/pages/error.html")),
];

/// Compiled page templates.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Render a page template with the given context.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map(Html)
            .map_err(|e| {
                tracing::error!("Failed to render page {}: {}", name, e);
                AppError::Internal(format!("Failed to render page {}", name))
            })
    }

    /// Error page carrying the status of `error`.
    pub fn error_page(&self, error: &AppError) -> Response {
        let status = error.status_code();
        let page = self.render(
            "error.html",
            context! {
                status => status.as_u16(),
                code => error.error_code(),
                message => error.message(),
            },
        );

        match page {
            Ok(html) => (status, html).into_response(),
            Err(_) => (status, error.message()).into_response(),
        }
    }

    /// Unwrap a page result, rendering failures as an error page.
    pub fn respond(&self, result: Result<Response, AppError>) -> Response {
        result.unwrap_or_else(|error| {
            tracing::warn!("Page request failed: {}", error);
            self.error_page(&error)
        })
    }
}
