use crate::application::{
    catalog,
    rental::{self, RentalApplicationError, ServiceDependencies},
};
use crate::domain::{
    commands::{AddBook, BorrowBook, ReturnBook},
    value_objects::{BookId, LoanId},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    auth::Identity,
    error::ApiError,
    types::{
        AddBookRequest, BookResponse, BookReturnedResponse, BorrowBookRequest,
        BorrowBookResponse, LoanResponse, ReturnBookRequest, UpdateBookRequest, UserLoanResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub jwt_secret: String,
}

// ============================================================================
// Rental handlers
// ============================================================================

/// POST /api/v1/rent/book - 書籍を借りる
///
/// 借り手は認証トークンから決まる。
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Json(req), _): WithRejection<Json<BorrowBookRequest>, ApiError>,
) -> Result<(StatusCode, Json<BorrowBookResponse>), ApiError> {
    let cmd = BorrowBook {
        book_id: BookId::from_uuid(req.book_id),
        borrower_id: identity.borrower_id,
        duration_days: req.duration_in_days,
        requested_at: chrono::Utc::now(),
    };

    let loan_id = rental::borrow_book(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowBookResponse {
            loan_id: loan_id.value(),
        }),
    ))
}

/// POST /api/v1/rent/return - 書籍を返却する
///
/// 借り手本人のみ返却できる（トランザクション内で再検証される）。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Json(req), _): WithRejection<Json<ReturnBookRequest>, ApiError>,
) -> Result<Json<BookReturnedResponse>, ApiError> {
    let cmd = ReturnBook {
        loan_id: LoanId::from_uuid(req.id),
        borrower_id: identity.borrower_id,
        returned_at: chrono::Utc::now(),
    };

    let returned = rental::return_book(&state.service_deps, cmd).await?;

    Ok(Json(BookReturnedResponse {
        loan_id: returned.loan_id.value(),
        returned_at: returned.returned_at,
    }))
}

/// GET /api/v1/rent/history - 全貸出記録（管理者のみ）
pub async fn list_all_history(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    identity.require_admin()?;

    let loans = rental::list_all_history(&state.service_deps).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /api/v1/rent/user-history - 自分の貸出記録
pub async fn list_user_history(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<UserLoanResponse>>, ApiError> {
    let history = rental::list_borrower_history(&state.service_deps, identity.borrower_id).await?;
    Ok(Json(history.into_iter().map(UserLoanResponse::from).collect()))
}

/// GET /api/v1/rent/loans/:id - 貸出記録を1件取得
///
/// 借り手本人と管理者のみ参照できる。
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Path(loan_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = rental::get_loan(&state.service_deps, LoanId::from_uuid(loan_id)).await?;

    if !identity.is_admin() && loan.core().borrower_id != identity.borrower_id {
        return Err(RentalApplicationError::Unauthorized.into());
    }

    Ok(Json(LoanResponse::from(loan)))
}

// ============================================================================
// Catalog handlers
// ============================================================================

/// GET /api/v1/books
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = catalog::list_books(&state.service_deps).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /api/v1/books/:id
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(book_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;
    Ok(Json(BookResponse::from(book)))
}

/// POST /api/v1/books - 書籍を登録（管理者のみ）
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Json(req), _): WithRejection<Json<AddBookRequest>, ApiError>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    identity.require_admin()?;

    let cmd = AddBook {
        name: req.name,
        quantity: req.quantity,
        added_at: chrono::Utc::now(),
    };
    let book = catalog::add_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /api/v1/books/:id - 書名を変更（管理者のみ）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Path(book_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateBookRequest>, ApiError>,
) -> Result<Json<BookResponse>, ApiError> {
    identity.require_admin()?;

    let book_id = BookId::from_uuid(book_id);
    catalog::rename_book(&state.service_deps, book_id, &req.name).await?;
    let book = catalog::get_book(&state.service_deps, book_id).await?;

    Ok(Json(BookResponse::from(book)))
}

/// DELETE /api/v1/books/:id - 書籍を削除（管理者のみ）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    WithRejection(Path(book_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;

    catalog::remove_book(&state.service_deps, BookId::from_uuid(book_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
