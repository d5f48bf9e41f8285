use crate::domain::{
    loan::Loan,
    value_objects::{BorrowerId, LoanId},
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 借り手ごとの貸出履歴ビュー（書名を結合済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerLoanView {
    pub loan: Loan,
    pub book_name: String,
}

/// 貸出履歴の読み取り専用ポート
///
/// 特別な分離レベルは要求しない。結果は開始日時の昇順（同時刻はID順）で返す。
#[async_trait]
pub trait LoanHistory: Send + Sync {
    /// すべての貸出記録
    async fn list_all(&self) -> Result<Vec<Loan>>;

    /// 借り手の貸出記録（書名付き）
    async fn list_for_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<BorrowerLoanView>>;

    /// IDで貸出記録を取得する。存在しなければ `None`
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;
}
