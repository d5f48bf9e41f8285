use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerId, LoanId};

/// コマンド：書籍を借りる
///
/// `duration_days` は未検証の値。貸出エンジンがトランザクション開始前に検証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub duration_days: i32,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub loan_id: LoanId,
    pub borrower_id: BorrowerId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBook {
    pub name: String,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}
