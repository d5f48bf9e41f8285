use crate::domain::{
    loan::{Loan, LoanCore},
    value_objects::{BookId, BorrowerId, LoanId, RentalDuration},
};
use crate::ports::loan_history::{
    BorrowerLoanView, LoanHistory as LoanHistoryTrait, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをLoanに変換する
///
/// returned_atの有無で貸出中・返却済みの状態を復元する。
pub(super) fn map_row_to_loan(row: &PgRow) -> Loan {
    let core = LoanCore {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        borrower_id: BorrowerId::from_uuid(row.get("borrower_id")),
        duration: RentalDuration::from_stored(row.get("duration_days")),
        started_at: row.get("started_at"),
    };
    Loan::from_parts(core, row.get("returned_at"))
}

/// LoanHistoryのPostgreSQL実装
///
/// 読み取り専用。トランザクションは使わない。
pub struct LoanHistory {
    pool: PgPool,
}

impl LoanHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanHistoryTrait for LoanHistory {
    async fn list_all(&self) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                borrower_id,
                duration_days,
                started_at,
                returned_at
            FROM loans
            ORDER BY started_at ASC, loan_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_loan).collect())
    }

    /// 借り手の貸出記録を書名と結合して取得
    ///
    /// (borrower_id, started_at)のインデックスを使用。
    async fn list_for_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<BorrowerLoanView>> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.loan_id,
                l.book_id,
                l.borrower_id,
                l.duration_days,
                l.started_at,
                l.returned_at,
                b.name AS book_name
            FROM loans AS l
            INNER JOIN books AS b ON l.book_id = b.book_id
            WHERE l.borrower_id = $1
            ORDER BY l.started_at ASC, l.loan_id ASC
            "#,
        )
        .bind(borrower_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| BorrowerLoanView {
                loan: map_row_to_loan(row),
                book_name: row.get("book_name"),
            })
            .collect())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
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
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_loan))
    }
}
