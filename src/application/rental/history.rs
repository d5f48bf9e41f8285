use crate::domain::{
    loan::Loan,
    value_objects::{BorrowerId, LoanId},
};
use crate::ports::BorrowerLoanView;

use super::errors::{RentalApplicationError, Result};
use super::rental_service::ServiceDependencies;

/// 全貸出記録（開始日時の昇順）
pub async fn list_all_history(deps: &ServiceDependencies) -> Result<Vec<Loan>> {
    deps.loan_history
        .list_all()
        .await
        .map_err(RentalApplicationError::StoreFailure)
}

/// 借り手の貸出記録（書名付き、開始日時の昇順）
///
/// 記録がない借り手には空の一覧を返す。
pub async fn list_borrower_history(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
) -> Result<Vec<BorrowerLoanView>> {
    deps.loan_history
        .list_for_borrower(borrower_id)
        .await
        .map_err(RentalApplicationError::StoreFailure)
}

/// 1件の貸出記録
///
/// 存在しない場合は空の値ではなく `LoanNotFound` を返す。
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    deps.loan_history
        .get_by_id(loan_id)
        .await
        .map_err(RentalApplicationError::StoreFailure)?
        .ok_or(RentalApplicationError::LoanNotFound)
}
