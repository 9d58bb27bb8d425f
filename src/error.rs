use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::{MoneyError, PeriodError, SettingsError};
use crate::engine::{CommissionError, ProfitError};

/// Application-level error taxonomy.
///
/// Every failure either aborts its whole unit of work or propagates; nothing
/// is swallowed inside a calculation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<CommissionError> for AppError {
    fn from(err: CommissionError) -> Self {
        match err {
            CommissionError::OrgNotFound(_) | CommissionError::BdmNotFound { .. } => {
                AppError::NotFound(err.to_string())
            }
            CommissionError::Db(db) => db.into(),
        }
    }
}

impl From<ProfitError> for AppError {
    fn from(err: ProfitError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<MoneyError> for AppError {
    fn from(err: MoneyError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Permission(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Storage(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_profit_error_maps_to_validation() {
        let err: AppError = ProfitError::CostsExceedValue.into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_validation_renders_400_with_error_body() {
        let response = AppError::Validation("costs exceed deal value".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_permission_renders_403() {
        let response = AppError::Permission("admins only".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
