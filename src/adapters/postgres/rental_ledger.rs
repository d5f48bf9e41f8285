use crate::domain::{
    loan::{Loan, OnLoan},
    value_objects::{BookId, BorrowerId, LoanId},
};
use crate::ports::rental_ledger::{
    LedgerTransaction, RentalLedger as RentalLedgerTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::loan_history::map_row_to_loan;

/// RentalLedgerのPostgreSQL実装
///
/// 在庫数と返却日時はすべて条件付きUPDATE1文で書き換える。
/// 同じ書籍への同時貸出は行ロックで直列化され、
/// 異なる書籍への操作は互いを待たない。
pub struct RentalLedger {
    pool: PgPool,
}

impl RentalLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalLedgerTrait for RentalLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// sqlxのトランザクション
///
/// commitせずにdropされるとsqlxがROLLBACKを発行する。
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PostgresTransaction {
    async fn take_copy(&mut self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_quantity = available_quantity - 1
            WHERE book_id = $1 AND available_quantity > 0
            "#,
        )
        .bind(book_id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn put_back_copy(&mut self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_quantity = available_quantity + 1
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn book_exists(&mut self, book_id: BookId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE book_id = $1)")
                .bind(book_id.value())
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    async fn insert_loan(&mut self, loan: &OnLoan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                borrower_id,
                duration_days,
                started_at,
                returned_at
            )
            VALUES ($1, $2, $3, $4, $5, NULL)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.borrower_id.value())
        .bind(loan.duration.days())
        .bind(loan.started_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_loan(&mut self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                borrower_id,
                duration_days,
                started_at,
                returned_at
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $3
            WHERE loan_id = $1 AND borrower_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(loan_id.value())
        .bind(borrower_id.value())
        .bind(returned_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
