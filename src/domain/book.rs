use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, BookId};

/// 在庫台帳の書籍
///
/// 不変条件：`available_quantity >= 0`。
/// `available_quantity` を書き換えるのは貸出エンジンだけで、
/// カタログ操作（書名変更など）はこの値に触れない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub name: String,
    pub available_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// 書名を正規化・検証する（前後の空白を除去、空は不可）
pub fn normalize_name(name: &str) -> Result<String, BookError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BookError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// 純粋関数：書籍を登録する
///
/// 副作用なし。保存前の新しい書籍を返す。
pub fn register_book(
    name: &str,
    quantity: i32,
    added_at: DateTime<Utc>,
) -> Result<Book, BookError> {
    let name = normalize_name(name)?;
    if quantity < 0 {
        return Err(BookError::NegativeQuantity(quantity));
    }

    Ok(Book {
        book_id: BookId::new(),
        name,
        available_quantity: quantity,
        created_at: added_at,
    })
}
