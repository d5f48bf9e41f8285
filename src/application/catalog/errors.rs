use thiserror::Error;

/// カタログ操作のエラー
#[derive(Debug, Error)]
pub enum CatalogApplicationError {
    /// 入力が不正
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出記録から参照されているため削除できない
    #[error("Book is referenced by loan records")]
    BookInUse,

    /// カタログストアのエラー
    #[error("Catalog store failure")]
    StoreFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, CatalogApplicationError>;
