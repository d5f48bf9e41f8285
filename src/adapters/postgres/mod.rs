pub mod catalog;
pub mod loan_history;
pub mod rental_ledger;

// パブリックに型を再エクスポート
pub use catalog::Catalog as PostgresCatalog;
pub use loan_history::LoanHistory as PostgresLoanHistory;
pub use rental_ledger::RentalLedger as PostgresRentalLedger;

/// スキーマのマイグレーションを適用する
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
