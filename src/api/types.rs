use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{book::Book, loan::Loan};
use crate::ports::BorrowerLoanView;

/// 貸出リクエスト（POST /api/v1/rent/book）
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowBookRequest {
    pub book_id: Uuid,
    pub duration_in_days: i32,
}

/// 貸出成功レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowBookResponse {
    pub loan_id: Uuid,
}

/// 返却リクエスト（POST /api/v1/rent/return）
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnBookRequest {
    pub id: Uuid,
}

/// 返却成功レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookReturnedResponse {
    pub loan_id: Uuid,
    pub returned_at: DateTime<Utc>,
}

/// 貸出記録レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub duration_in_days: i32,
    pub start_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: String,
}

fn status_of(loan: &Loan) -> &'static str {
    match loan {
        Loan::OnLoan(_) => "on_loan",
        Loan::Returned(_) => "returned",
    }
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        let core = loan.core();
        Self {
            id: core.loan_id.value(),
            book_id: core.book_id.value(),
            borrower_id: core.borrower_id.value(),
            duration_in_days: core.duration.days(),
            start_time: core.started_at,
            due_time: core.due_at(),
            return_time: loan.returned_at(),
            status: status_of(&loan).to_string(),
        }
    }
}

/// 借り手自身の貸出履歴レスポンス（書名付き）
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoanResponse {
    pub id: Uuid,
    pub book_name: String,
    pub duration_in_days: i32,
    pub start_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<BorrowerLoanView> for UserLoanResponse {
    fn from(view: BorrowerLoanView) -> Self {
        let core = view.loan.core();
        Self {
            id: core.loan_id.value(),
            book_name: view.book_name,
            duration_in_days: core.duration.days(),
            start_time: core.started_at,
            return_time: view.loan.returned_at(),
            status: status_of(&view.loan).to_string(),
        }
    }
}

/// 書籍登録リクエスト
#[derive(Debug, Serialize, Deserialize)]
pub struct AddBookRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: i32,
}

/// 書名変更リクエスト
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    pub name: String,
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub name: String,
    pub available_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.book_id.value(),
            name: book.name,
            available_quantity: book.available_quantity,
            created_at: book.created_at,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
