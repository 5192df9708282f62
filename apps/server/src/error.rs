//! HTTP error mapping.
//!
//! ```text
//! ValidationError → CoreError ─┐
//!                   DbError ───┼─► SaleError ─► ApiError ─► { code, message, saleId? }
//!      auth failures ──────────┘                  │
//!                                                 └─► status 400 / 401 / 403 / 404 / 409 / 500
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use smartpos_core::{CoreError, ValidationError};
use smartpos_db::{DbError, SaleError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired or badly signed token.
    #[error("{0}")]
    Unauthorized(String),

    /// Token is valid but no local user exists for it yet.
    #[error("User not provisioned")]
    UserNotProvisioned,

    /// Authenticated, but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Sale(#[from] SaleError),

    /// The spawned sale task died before answering.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Sale(SaleError::Core(err))
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Sale(SaleError::Db(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Sale(err.into())
    }
}

/// A body that does not deserialize is a validation failure, reported in
/// the same `{code, message}` shape as every other one.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: rejection.body_text(),
        }
        .into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::InvalidFormat {
            field: "query".to_string(),
            reason: rejection.body_text(),
        }
        .into()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sale_id: Option<String>,
}

impl ApiError {
    /// Status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::UserNotProvisioned => (StatusCode::UNAUTHORIZED, "USER_NOT_PROVISIONED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Sale(SaleError::Core(e)) => core_status(e),
            ApiError::Sale(SaleError::Db(e)) => db_status(e),
            ApiError::Sale(SaleError::CreatedButUnreadable { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SALE_CREATED_UNREADABLE")
            }
        }
    }
}

fn core_status(err: &CoreError) -> (StatusCode, &'static str) {
    match err {
        CoreError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
        CoreError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "CUSTOMER_NOT_FOUND"),
        CoreError::SaleNotFound(_) => (StatusCode::NOT_FOUND, "SALE_NOT_FOUND"),
        CoreError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK"),
        CoreError::InsufficientCredit { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_CREDIT"),
        CoreError::EmptyCart => (StatusCode::BAD_REQUEST, "EMPTY_CART"),
        CoreError::CartTooLarge { .. } => (StatusCode::BAD_REQUEST, "CART_TOO_LARGE"),
        CoreError::InvalidPaymentAmount { .. } => {
            (StatusCode::BAD_REQUEST, "INVALID_PAYMENT_AMOUNT")
        }
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
    }
}

fn db_status(err: &DbError) -> (StatusCode, &'static str) {
    match err {
        DbError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DbError::UniqueViolation { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
        e if e.is_retryable() => (StatusCode::CONFLICT, "CONFLICT"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(code, error = %self, "Request failed");
        }

        let sale_id = match &self {
            ApiError::Sale(SaleError::CreatedButUnreadable { sale_id, .. }) => {
                Some(sale_id.clone())
            }
            _ => None,
        };

        let body = ErrorBody {
            code,
            message: self.to_string(),
            sale_id,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpos_core::Money;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = CoreError::ProductNotFound("p-1".into()).into();
        assert_eq!(
            err.status_and_code(),
            (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND")
        );
    }

    #[test]
    fn test_policy_violation_maps_to_400() {
        let err: ApiError = CoreError::InsufficientCredit {
            available: Money::from_cents(2_000),
            requested: Money::from_cents(2_500),
        }
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);

        let err: ApiError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
    }

    #[test]
    fn test_lost_race_maps_to_409() {
        let err: ApiError = DbError::conflict("credit headroom changed").into();
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));

        let err: ApiError = DbError::duplicate("email", "a@b.ec").into();
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn test_unreadable_sale_carries_id() {
        let err = ApiError::Sale(SaleError::CreatedButUnreadable {
            sale_id: "s-1".into(),
            reason: "gone".into(),
        });
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "SALE_CREATED_UNREADABLE")
        );

        let body = ErrorBody {
            code: "SALE_CREATED_UNREADABLE",
            message: err.to_string(),
            sale_id: Some("s-1".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["saleId"], "s-1");
    }

    #[test]
    fn test_error_body_omits_missing_sale_id() {
        let body = ErrorBody {
            code: "FORBIDDEN",
            message: "no".into(),
            sale_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("saleId").is_none());
    }
}
