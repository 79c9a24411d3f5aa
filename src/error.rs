// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external payment gateway issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError {
                message,
                field_errors,
            } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::NotInitialized => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::manager::DatabaseError::ConfigMissing(_) => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::manager::DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            other => {
                // Log the real error but return a generic message
                tracing::error!("SQLx error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::ownership::OwnershipError> for ApiError {
    fn from(err: crate::ownership::OwnershipError) -> Self {
        match err {
            crate::ownership::OwnershipError::NotFound(kind) => {
                ApiError::not_found(format!("{} not found", kind))
            }
            crate::ownership::OwnershipError::NotOwner(kind) => {
                ApiError::forbidden(format!("not the owner of this {}", kind))
            }
            crate::ownership::OwnershipError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::lecture::LectureError> for ApiError {
    fn from(err: crate::services::lecture::LectureError) -> Self {
        match err {
            crate::services::lecture::LectureError::HasPurchases => {
                ApiError::conflict("lecture has purchases and cannot be deleted")
            }
            crate::services::lecture::LectureError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::purchase::PurchaseError> for ApiError {
    fn from(err: crate::services::purchase::PurchaseError) -> Self {
        match err {
            crate::services::purchase::PurchaseError::UnknownLecture => {
                ApiError::bad_request("unknown lecture")
            }
            crate::services::purchase::PurchaseError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::review::ReviewError> for ApiError {
    fn from(err: crate::services::review::ReviewError) -> Self {
        match err {
            crate::services::review::ReviewError::ParentNotFound => {
                ApiError::not_found("parent review not found")
            }
            crate::services::review::ReviewError::NotPurchaser => {
                ApiError::forbidden("only purchasers may review this lecture")
            }
            crate::services::review::ReviewError::InvalidRating => {
                ApiError::bad_request("rating must be between 1 and 5")
            }
            crate::services::review::ReviewError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::payment::PaymentError> for ApiError {
    fn from(err: crate::services::payment::PaymentError) -> Self {
        match err {
            crate::services::payment::PaymentError::OrderNotFound => {
                ApiError::not_found("payment order not found")
            }
            crate::services::payment::PaymentError::UnknownLecture => {
                ApiError::bad_request("unknown lecture")
            }
            crate::services::payment::PaymentError::Gateway(e) => e.into(),
            crate::services::payment::PaymentError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::gateway::GatewayError> for ApiError {
    fn from(err: crate::services::gateway::GatewayError) -> Self {
        match err {
            crate::services::gateway::GatewayError::PaymentNotFound(uid) => {
                ApiError::not_found(format!("payment {} not found at gateway", uid))
            }
            crate::services::gateway::GatewayError::NotConfigured => {
                ApiError::service_unavailable("payment gateway not configured")
            }
            other => {
                tracing::error!("Payment gateway error: {}", other);
                ApiError::bad_gateway("payment gateway request failed")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 409);
        assert_eq!(ApiError::internal_server_error("x").status_code(), 500);
        assert_eq!(ApiError::bad_gateway("x").status_code(), 502);
    }

    #[test]
    fn json_body_carries_message_and_code() {
        let body = ApiError::forbidden("not the owner of this lecture").to_json();
        assert_eq!(body["error"], json!(true));
        assert_eq!(body["message"], json!("not the owner of this lecture"));
        assert_eq!(body["code"], json!("FORBIDDEN"));
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn generic_sqlx_errors_hide_detail() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("pool"));
    }
}
