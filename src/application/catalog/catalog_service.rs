use crate::domain::{
    book::{self, Book},
    commands::AddBook,
    value_objects::BookId,
};
use crate::ports::RemoveOutcome;

use crate::application::rental::ServiceDependencies;

use super::errors::{CatalogApplicationError, Result};

/// 書籍を登録する
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    let book = book::register_book(&cmd.name, cmd.quantity, cmd.added_at)
        .map_err(|e| CatalogApplicationError::Validation(e.to_string()))?;

    deps.catalog
        .insert(&book)
        .await
        .map_err(CatalogApplicationError::StoreFailure)?;

    tracing::info!(book_id = %book.book_id, quantity = book.available_quantity, "book added");
    Ok(book)
}

pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.catalog
        .list()
        .await
        .map_err(CatalogApplicationError::StoreFailure)
}

pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.catalog
        .get(book_id)
        .await
        .map_err(CatalogApplicationError::StoreFailure)?
        .ok_or(CatalogApplicationError::BookNotFound)
}

/// 書名を変更する
///
/// 在庫数は貸出エンジンだけが書き換えるため、ここでは変更しない。
pub async fn rename_book(deps: &ServiceDependencies, book_id: BookId, name: &str) -> Result<()> {
    let name =
        book::normalize_name(name).map_err(|e| CatalogApplicationError::Validation(e.to_string()))?;

    let renamed = deps
        .catalog
        .rename(book_id, &name)
        .await
        .map_err(CatalogApplicationError::StoreFailure)?;

    if !renamed {
        return Err(CatalogApplicationError::BookNotFound);
    }
    Ok(())
}

/// 書籍を削除する
///
/// 貸出記録は監査証跡として削除しないため、参照されている書籍は削除できない。
pub async fn remove_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    let outcome = deps
        .catalog
        .remove(book_id)
        .await
        .map_err(CatalogApplicationError::StoreFailure)?;

    match outcome {
        RemoveOutcome::Removed => {
            tracing::info!(%book_id, "book removed");
            Ok(())
        }
        RemoveOutcome::NotFound => Err(CatalogApplicationError::BookNotFound),
        RemoveOutcome::StillReferenced => Err(CatalogApplicationError::BookInUse),
    }
}
