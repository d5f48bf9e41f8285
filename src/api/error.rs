use crate::application::{catalog::CatalogApplicationError, rental::RentalApplicationError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Rental(RentalApplicationError),
    Catalog(CatalogApplicationError),
    /// 認証情報がない、または検証に失敗した
    Unauthenticated(String),
    /// 認証済みだが権限がない
    Forbidden(String),
    /// リクエストの本文またはパスを解釈できない
    MalformedRequest(String),
}

impl From<RentalApplicationError> for ApiError {
    fn from(err: RentalApplicationError) -> Self {
        ApiError::Rental(err)
    }
}

impl From<CatalogApplicationError> for ApiError {
    fn from(err: CatalogApplicationError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg.clone())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            // 400 Bad Request - 識別子の欠落や不正なUUIDも入力検証エラーとして扱う
            ApiError::MalformedRequest(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }

            ApiError::Rental(err) => match err {
                // 400 Bad Request - トランザクション開始前に拒否
                RentalApplicationError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                // 403 Forbidden - 他人の貸出
                RentalApplicationError::Unauthorized => (
                    StatusCode::FORBIDDEN,
                    "UNAUTHORIZED",
                    "Loan belongs to another borrower".to_string(),
                ),
                // 404 Not Found
                RentalApplicationError::BookNotFound => {
                    (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND", err.to_string())
                }
                RentalApplicationError::LoanNotFound => {
                    (StatusCode::NOT_FOUND, "LOAN_NOT_FOUND", err.to_string())
                }
                // 409 Conflict - 共有状態との競合
                RentalApplicationError::NotAvailable => {
                    (StatusCode::CONFLICT, "NOT_AVAILABLE", err.to_string())
                }
                RentalApplicationError::AlreadyReturned => {
                    (StatusCode::CONFLICT, "ALREADY_RETURNED", err.to_string())
                }
                RentalApplicationError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "Operation timed out, please retry".to_string(),
                ),
                // 500 Internal Server Error - 詳細はログのみ
                RentalApplicationError::StoreFailure(e) => {
                    tracing::error!(error = %e, "rental store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORE_FAILURE",
                        "Internal server error".to_string(),
                    )
                }
            },

            ApiError::Catalog(err) => match err {
                CatalogApplicationError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CatalogApplicationError::BookNotFound => {
                    (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND", err.to_string())
                }
                CatalogApplicationError::BookInUse => {
                    (StatusCode::CONFLICT, "BOOK_IN_USE", err.to_string())
                }
                CatalogApplicationError::StoreFailure(e) => {
                    tracing::error!(error = %e, "catalog store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORE_FAILURE",
                        "Internal server error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();
        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
