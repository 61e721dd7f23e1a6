//! Transport-level error pages
//!
//! Requests that match no route never reach an adapter; the router falls
//! back to [`error_page`], which asks a [`PageRenderer`] for HTML.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("no template for status {0}")]
    MissingTemplate(u16),
}

/// Templating collaborator for error pages
pub trait PageRenderer: Send + Sync {
    fn render(&self, status: StatusCode) -> Result<String, PageError>;
}

/// Minimal built-in renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPages;

impl PageRenderer for PlainPages {
    fn render(&self, status: StatusCode) -> Result<String, PageError> {
        let reason = status.canonical_reason().unwrap_or("Error");
        Ok(format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\
             <body><h1>{code}</h1><p>{reason}</p></body></html>\n",
            code = status.as_u16(),
        ))
    }
}

/// Renders the page for `status`, falling back to plain text when the
/// renderer fails
pub fn error_page(renderer: &dyn PageRenderer, method: &Method, uri: &Uri, status: StatusCode) -> Response {
    error!(%method, path = %uri.path(), status = status.as_u16(), "Can not access");

    match renderer.render(status) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "Error page rendering failed");
            (status, status.canonical_reason().unwrap_or("Error")).into_response()
        }
    }
}
