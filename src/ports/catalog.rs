use crate::domain::{book::Book, value_objects::BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
    /// 貸出記録から参照されているため削除できない
    StillReferenced,
}

/// カタログポート
///
/// 書籍レコードの作成・参照・書名変更・削除。
/// 在庫数は登録時の初期値以外は書き換えない。
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn insert(&self, book: &Book) -> Result<()>;

    async fn list(&self) -> Result<Vec<Book>>;

    async fn get(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書名のみ変更する。書籍が存在しなければ `false`
    async fn rename(&self, book_id: BookId, name: &str) -> Result<bool>;

    async fn remove(&self, book_id: BookId) -> Result<RemoveOutcome>;
}
