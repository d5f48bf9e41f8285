use crate::domain::{book::Book, value_objects::BookId};
use crate::ports::catalog::{Catalog as CatalogTrait, RemoveOutcome, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_book(row: &PgRow) -> Book {
    Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        name: row.get("name"),
        available_quantity: row.get("available_quantity"),
        created_at: row.get("created_at"),
    }
}

/// CatalogのPostgreSQL実装
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogTrait for Catalog {
    async fn insert(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (book_id, name, available_quantity, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.name)
        .bind(book.available_quantity)
        .bind(book.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, name, available_quantity, created_at
            FROM books
            ORDER BY created_at ASC, book_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_book).collect())
    }

    async fn get(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, name, available_quantity, created_at
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    /// 書名のみ更新する（available_quantityには触れない）
    async fn rename(&self, book_id: BookId, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE books SET name = $2 WHERE book_id = $1")
            .bind(book_id.value())
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 書籍を削除する
    ///
    /// 貸出記録から参照されている場合は外部キー制約（RESTRICT）で拒否される。
    async fn remove(&self, book_id: BookId) -> Result<RemoveOutcome> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(RemoveOutcome::NotFound),
            Ok(_) => Ok(RemoveOutcome::Removed),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Ok(RemoveOutcome::StillReferenced)
            }
            Err(e) => Err(e.into()),
        }
    }
}
