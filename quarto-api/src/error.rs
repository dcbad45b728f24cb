//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use quarto_core::{ActionError, NotationError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Action(#[from] ActionError),
    #[error("{0}")]
    Notation(#[from] NotationError),
    #[error("Action {index} ({notation}): {source}")]
    Replay {
        index: usize,
        notation: String,
        source: ActionError,
    },
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("Invalid move index {0}")]
    InvalidIndex(usize),
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorModel {
            detail: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
