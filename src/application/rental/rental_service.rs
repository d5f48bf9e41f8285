use crate::domain::{
    self, ReturnBookError,
    commands::{BorrowBook, ReturnBook},
    loan::{OnLoan, ReturnedLoan},
    value_objects::{LoanId, RentalDuration, RentalPolicy},
};
use crate::ports::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{RentalApplicationError, Result};

/// サービスの依存関係
///
/// 起動時に1度だけ構築され、各リクエストへ参照で渡される。
/// 振る舞いは持たず、関数に依存関係を渡すためのデータ構造。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub rental_ledger: Arc<dyn RentalLedger>,
    pub loan_history: Arc<dyn LoanHistory>,
    pub catalog: Arc<dyn Catalog>,
    pub policy: RentalPolicy,
    pub operation_timeout: Duration,
}

/// トランザクション内の作業に期限を設ける
///
/// 期限切れの場合はfutureごと破棄され、保持していたトランザクションも
/// dropされてロールバックされる。COMMITは期限の外で発行するため、
/// `Timeout` が返った操作は確定していない。
async fn with_deadline<T>(
    timeout: Duration,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "rental operation timed out");
            Err(RentalApplicationError::Timeout)
        }
    }
}

async fn commit(tx: Box<dyn LedgerTransaction>) -> Result<()> {
    tx.commit()
        .await
        .map_err(RentalApplicationError::StoreFailure)
}

/// ビジネスルール違反でトランザクションを明示的に破棄する
///
/// ROLLBACK自体が失敗してもdrop時に破棄されるため、呼び出し元には
/// 元のビジネスエラーを返す。
async fn abort<T>(tx: Box<dyn LedgerTransaction>, error: RentalApplicationError) -> Result<T> {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "explicit rollback failed");
    }
    tracing::warn!(reason = %error, "rental transaction aborted");
    Err(error)
}

/// 書籍を借りる
///
/// ビジネスルール：
/// - 貸出日数がポリシーの範囲内であること（トランザクション前に検証）
/// - 書籍が存在すること
/// - 在庫が1以上であること
///
/// # 一貫性保証
///
/// 在庫の確認と減算は「在庫 > 0 の場合のみ1減らす」条件付き更新1文で行い、
/// 更新行数0を「在庫なし」とみなす。読んでから書く2段階にはしない。
/// 在庫の減算と貸出記録の追加は同じトランザクションで確定し、
/// どちらか一方だけが残ることはない。
///
/// # 戻り値
/// 成功時は作成された貸出のID
#[tracing::instrument(
    skip(deps, cmd),
    fields(book_id = %cmd.book_id, borrower_id = %cmd.borrower_id, days = cmd.duration_days)
)]
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<LoanId> {
    // 1. 入力検証（トランザクション開始前）
    let duration = deps
        .policy
        .duration(cmd.duration_days)
        .map_err(|e| RentalApplicationError::Validation(e.to_string()))?;

    // 2. 期限付きでトランザクション内の作業を実行
    let (tx, loan) = with_deadline(
        deps.operation_timeout,
        borrow_in_transaction(deps.rental_ledger.as_ref(), cmd, duration),
    )
    .await?;

    // 3. 確定
    commit(tx).await?;

    tracing::info!(loan_id = %loan.loan_id, "book borrowed");
    Ok(loan.loan_id)
}

async fn borrow_in_transaction(
    ledger: &dyn RentalLedger,
    cmd: BorrowBook,
    duration: RentalDuration,
) -> Result<(Box<dyn LedgerTransaction>, OnLoan)> {
    let mut tx = ledger
        .begin()
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    // 在庫 > 0 の場合のみ1減らす
    let taken = tx
        .take_copy(cmd.book_id)
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    if !taken {
        // 0行：書籍がないのか在庫がないのかを区別する
        let exists = tx
            .book_exists(cmd.book_id)
            .await
            .map_err(RentalApplicationError::StoreFailure)?;
        let error = if exists {
            RentalApplicationError::NotAvailable
        } else {
            RentalApplicationError::BookNotFound
        };
        return abort(tx, error).await;
    }

    // ドメイン層の純粋関数で貸出記録を作成
    let loan = domain::loan::borrow_book(cmd.book_id, cmd.borrower_id, duration, cmd.requested_at);

    // 失敗した場合はtxのdropでロールバックされる
    tx.insert_loan(&loan)
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    Ok((tx, loan))
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出記録が存在すること
/// - 返却を求めた利用者が借り手本人であること
/// - 返却済みでないこと
///
/// # 一貫性保証
///
/// 返却日時の設定は「借り手が一致し、かつ未返却の場合のみ」の条件付き更新で行う。
/// 同じ貸出への同時返却では一方だけが1行を更新し、他方は `AlreadyReturned` となる。
/// 在庫の加算は返却日時の設定と同じトランザクションで確定するため、
/// 1つの貸出について在庫の増減は差し引き0になる。
///
/// # 戻り値
/// 成功時は返却済みの貸出記録
#[tracing::instrument(skip(deps, cmd), fields(loan_id = %cmd.loan_id, borrower_id = %cmd.borrower_id))]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnedLoan> {
    let (tx, returned) = with_deadline(
        deps.operation_timeout,
        return_in_transaction(deps.rental_ledger.as_ref(), cmd),
    )
    .await?;

    commit(tx).await?;

    tracing::info!(book_id = %returned.book_id, "book returned");
    Ok(returned)
}

async fn return_in_transaction(
    ledger: &dyn RentalLedger,
    cmd: ReturnBook,
) -> Result<(Box<dyn LedgerTransaction>, ReturnedLoan)> {
    let mut tx = ledger
        .begin()
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    // 1. 貸出記録を取得
    let Some(loan) = tx
        .find_loan(cmd.loan_id)
        .await
        .map_err(RentalApplicationError::StoreFailure)?
    else {
        return abort(tx, RentalApplicationError::LoanNotFound).await;
    };

    // 2. ドメイン層で所有者と状態を検証
    let returned = match domain::loan::return_book(loan, cmd.borrower_id, cmd.returned_at) {
        Ok(returned) => returned,
        Err(ReturnBookError::NotBorrower) => {
            return abort(tx, RentalApplicationError::Unauthorized).await;
        }
        Err(ReturnBookError::AlreadyReturned) => {
            return abort(tx, RentalApplicationError::AlreadyReturned).await;
        }
    };

    // 3. 未返却の場合のみ返却日時を設定
    let marked = tx
        .mark_returned(cmd.loan_id, cmd.borrower_id, cmd.returned_at)
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    if !marked {
        // 取得後に別の返却が先に確定した
        return abort(tx, RentalApplicationError::AlreadyReturned).await;
    }

    // 4. 在庫を1戻す
    let put_back = tx
        .put_back_copy(returned.book_id)
        .await
        .map_err(RentalApplicationError::StoreFailure)?;

    if !put_back {
        return abort(tx, RentalApplicationError::BookNotFound).await;
    }

    Ok((tx, returned))
}
