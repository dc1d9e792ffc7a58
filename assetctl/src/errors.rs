use crate::db::errors::DbError;
use crate::validation::FieldErrors;
use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error as ThisError;

pub const NOT_ALLOWED: &str = "You are not allowed to perform this operation";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Field-level validation failures
    #[error("Validation Failure")]
    Validation { errors: FieldErrors },

    /// Authentication required but not provided, or credentials rejected
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller is known but may not perform the operation
    #[error("Forbidden: {}", .message.as_deref().unwrap_or(NOT_ALLOWED))]
    Forbidden { message: Option<String> },

    /// Invalid request data that is not tied to a single field
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::Forbidden {
            message: Some(message.into()),
        }
    }

    pub fn unauthorized() -> Self {
        Error::Unauthenticated { message: None }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } if self.unique_violation_errors().is_some() => StatusCode::BAD_REQUEST,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { .. } => "Validation Failure".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Unauthorized".to_string()),
            Error::Forbidden { message } => message.clone().unwrap_or_else(|| NOT_ALLOWED.to_string()),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } if self.unique_violation_errors().is_some() => "Validation Failure".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Field errors to report, including unique-constraint races translated back to the message
    /// the pre-write duplicate check would have produced.
    pub fn validation_errors(&self) -> Option<FieldErrors> {
        match self {
            Error::Validation { errors } => Some(errors.clone()),
            Error::Database(_) => self.unique_violation_errors(),
            _ => None,
        }
    }

    fn unique_violation_errors(&self) -> Option<FieldErrors> {
        let Error::Database(db_err) = self else {
            return None;
        };
        let (field, message) = match db_err.unique_constraint()? {
            "users_email_unique" => ("email", "E-mail in use"),
            "users_company_username_unique" => ("username", "Username in use"),
            "asset_groups_company_name_unique" => ("assetGroupName", "Asset Group Name in use"),
            "statuses_company_name_unique" => ("statusName", "Status Name in use"),
            "vendors_company_name_unique" => ("vendorName", "Vendor Name already exists"),
            "assets_company_serial_code_unique" => ("serialCode", "Asset with given serial code already exists"),
            _ => return None,
        };
        Some(FieldErrors::from((field, message)))
    }
}

/// Error payload produced by [`Error::into_response`]. The envelope middleware completes it with
/// the request path and a timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<FieldErrors>,
}

/// Wire format of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub path: String,
    pub timestamp: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<FieldErrors>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            message: self.user_message(),
            validation_errors: self.validation_errors(),
        };
        let mut response = (self.status_code(), Json(&body)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Stamp `path` and `timestamp` onto error responses produced anywhere below this layer. Error
/// responses that did not come from [`Error`] get the status's reason phrase as their message.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let uri = request.uri();
    let path = uri.path_and_query().map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
    let response = next.run(request).await;

    let body = match response.extensions().get::<ErrorBody>() {
        Some(body) => body.clone(),
        // Rejections raised by axum itself, e.g. 405 for a known path with the wrong method
        None if response.status().is_client_error() || response.status().is_server_error() => ErrorBody {
            message: response.status().canonical_reason().unwrap_or("Request failed").to_string(),
            validation_errors: None,
        },
        None => return response,
    };

    let envelope = ErrorEnvelope {
        path,
        timestamp: Utc::now().timestamp_millis(),
        message: body.message,
        validation_errors: body.validation_errors,
    };
    (response.status(), Json(envelope)).into_response()
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
