use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Referenced user, post or edge does not exist
    NotFound(String),
    /// Duplicate unique key (username, post id)
    Conflict(String),
    /// Transport, pool or transaction failure talking to the graph store.
    /// Transient; the caller may retry.
    StoreUnavailable(String),
    /// The store returned something that breaks a data-model invariant
    InvariantViolation(String),
    BadRequest(String),
    Unauthorized(String),
    /// An external collaborator (blob storage) failed
    ServiceUnavailable(String),
    Configuration(String),
}

impl AppError {
    /// Errors the feed may skip over for a single friend without failing
    /// the whole aggregation.
    pub fn is_skippable(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::StoreUnavailable(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Graph store unavailable: {}", msg),
            AppError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::StoreUnavailable(msg) => {
                tracing::error!("Graph store unavailable: {}", msg);
                "Service temporarily unavailable".to_string()
            }
            AppError::InvariantViolation(msg) => {
                tracing::error!("Invariant violation: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Upstream service failed: {}", msg);
                "Service temporarily unavailable".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Classify a sqlx failure at the store boundary.
///
/// Unique violations become `Conflict`, row-shape problems become
/// `InvariantViolation` and everything else is treated as the store being
/// unavailable.
pub fn store_error(context: &str, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("{}: {}", context, db_err))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            AppError::InvariantViolation(format!("{}: unexpected row shape: {}", context, err))
        }
        _ => AppError::StoreUnavailable(format!("{}: {}", context, err)),
    }
}

pub type AppResult<T> = Result<T, AppError>;
