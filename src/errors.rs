//! Error types.

use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::task::JoinError;

use crate::render::RenderError;

/// Errors that end a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing under any search root matches the request.
    #[error("Path does not exist :(")]
    NotFound,

    /// The renderer failed. Nothing is cached.
    #[error("Vim error: {0}")]
    Render(#[from] RenderError),

    /// Error during IO.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A page template failed to register.
    #[error("invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// A page template failed to render.
    #[error("template error: {0}")]
    TemplateRender(#[from] handlebars::RenderError),

    /// The blocking render task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Join(#[from] JoinError),
}

impl Error {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
