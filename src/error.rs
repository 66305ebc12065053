// Error handling module for the CRM API
// Provides the shared JSON error envelope and the error type used by customer handlers

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

/// Consistent error response structure
///
/// Every failed request, whatever module produced it, is rendered as
/// `{"success": false, "message": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Customer not found")]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Build the `(status, envelope)` response pair shared by every error type
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Main error type for customer operations
///
/// Each variant maps to a specific HTTP status code. Sensitive details of
/// database and internal errors are logged but never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Request body could not be parsed
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Database operation errors
    /// Maps to HTTP 500 Internal Server Error
    DatabaseError(sqlx::Error),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message for this error; logs the full error at a level
    /// matching its severity
    pub fn error_message(&self) -> String {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                validation_message(errors)
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                message.clone()
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                format!("{} not found", resource)
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                "A database error occurred".to_string()
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::ValidationError(errors) => write!(f, "Validation error: {}", errors),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound { resource, id } => write!(f, "{} with id {} not found", resource, id),
            ApiError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.error_message())
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Convert JSON extractor rejections to ApiError
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Flatten validation errors into a single human-readable message
///
/// Fields are reported in alphabetical order so the message is stable.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().copied().collect();
    fields.sort_unstable();

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|field| {
            field_errors[&field].iter().map(move |e| match (&e.message, &*e.code) {
                (Some(message), _) => message.to_string(),
                (None, "blank") => format!("Field '{}' is required", field),
                (None, _) => format!("Invalid value for field '{}'", field),
            })
        })
        .collect();

    if messages.is_empty() {
        "Request validation failed".to_string()
    } else {
        messages.join("; ")
    }
}
