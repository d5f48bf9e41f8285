use crate::domain::{
    loan::{Loan, OnLoan},
    value_objects::{BookId, BorrowerId, LoanId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出台帳ポート
///
/// 在庫台帳と貸出台帳の2つの表にまたがる作業単位（トランザクション）を開く。
/// 貸出エンジンはこのポート越しにのみ在庫数と返却日時を書き換える。
#[async_trait]
pub trait RentalLedger: Send + Sync {
    /// 新しいトランザクションを開始する
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// 1つの作業単位
///
/// `commit` されずに破棄された場合、すべての変更はロールバックされる。
/// エラー・タイムアウト・キャンセルのどの経路でも部分的な書き込みは残らない。
///
/// 在庫数と返却日時の更新はすべて条件付き更新（比較して交換）として表現され、
/// 戻り値の `bool` は「1行が更新されたか」を示す。
#[async_trait]
pub trait LedgerTransaction: Send {
    /// 在庫数が1以上の場合に限り1減らす
    ///
    /// 在庫がない、または書籍が存在しない場合は `false`。
    async fn take_copy(&mut self, book_id: BookId) -> Result<bool>;

    /// 在庫数を1増やす。書籍が存在しない場合は `false`
    async fn put_back_copy(&mut self, book_id: BookId) -> Result<bool>;

    /// 書籍が存在するか
    async fn book_exists(&mut self, book_id: BookId) -> Result<bool>;

    /// 貸出記録を追加する
    async fn insert_loan(&mut self, loan: &OnLoan) -> Result<()>;

    /// 貸出記録を取得する
    async fn find_loan(&mut self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 返却日時を設定する
    ///
    /// 借り手が一致し、かつ返却日時が未設定の場合に限り更新する。
    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// 変更を確定する
    async fn commit(self: Box<Self>) -> Result<()>;

    /// 変更を破棄する
    async fn rollback(self: Box<Self>) -> Result<()>;
}
