use thiserror::Error;

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnBookError {
    /// 既に返却済み
    #[error("loan already returned")]
    AlreadyReturned,
    /// 返却を求めた利用者が借り手ではない
    #[error("requester is not the borrower of this loan")]
    NotBorrower,
}

/// 書籍登録・更新のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// 書名が空
    #[error("book name must not be empty")]
    EmptyName,
    /// 在庫数が負
    #[error("quantity must not be negative: {0}")]
    NegativeQuantity(i32),
}
