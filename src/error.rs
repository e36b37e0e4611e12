use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure a request handler can surface to the caller.
///
/// `NoMatches` and `Rejected` share the 406 status code for compatibility
/// with existing clients but stay distinct variants.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required fields: {0}")]
    MissingField(String),

    #[error("Missing '{0}' parameter")]
    MissingParameter(String),

    #[error("Invalid data type for {0}")]
    InvalidType(String),

    #[error("Quantity must be {0}")]
    InvalidQuantity(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Malformed query string: {0}")]
    MalformedQuery(String),

    #[error("Item not found")]
    NotFound(String),

    #[error("{0}")]
    Rejected(String),

    #[error("No matching items found")]
    NoMatches(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::MissingParameter(_)
            | AppError::InvalidType(_)
            | AppError::InvalidQuantity(_)
            | AppError::MalformedBody(_)
            | AppError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected(_) | AppError::NoMatches(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The item name or search query a lookup failure refers to.
    pub fn subject(&self) -> Option<&str> {
        match self {
            AppError::NotFound(name) | AppError::NoMatches(name) => Some(name),
            _ => None,
        }
    }

    /// Short label used as the outcome column of recorded metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingField(_) => "missing_field",
            AppError::MissingParameter(_) => "missing_parameter",
            AppError::InvalidType(_) => "invalid_type",
            AppError::InvalidQuantity(_) => "invalid_quantity",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::MalformedQuery(_) => "malformed_query",
            AppError::NotFound(_) => "not_found",
            AppError::Rejected(_) => "rejected",
            AppError::NoMatches(_) => "no_matches",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(ref e) = self {
            tracing::error!(error = %e, "Internal error");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
