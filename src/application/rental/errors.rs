use thiserror::Error;

/// 貸出エンジンのエラー
///
/// ビジネスルール違反はすべてトランザクション内で検出され、
/// ロールバックの後に型付きの結果として返される。
#[derive(Debug, Error)]
pub enum RentalApplicationError {
    /// 入力が不正（貸出日数が範囲外など）。トランザクション開始前に拒否
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出記録が存在しない
    #[error("Loan not found")]
    LoanNotFound,

    /// 在庫がない（条件付き減算が0行）
    #[error("Book is not available for loan")]
    NotAvailable,

    /// 既に返却済み（条件付き更新が0行）
    #[error("Loan already returned")]
    AlreadyReturned,

    /// 返却を求めた利用者が借り手ではない
    #[error("Requester is not the borrower of this loan")]
    Unauthorized,

    /// 期限内に完了しなかった。トランザクションはロールバック済み
    #[error("Operation timed out")]
    Timeout,

    /// ストアのエラー（接続断・制約違反など）。自動リトライはしない
    #[error("Store failure")]
    StoreFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, RentalApplicationError>;
