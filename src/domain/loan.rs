use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerId, LoanId, RentalDuration, ReturnBookError};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// 貸出記録の共通フィールド
///
/// 貸出中・返却済みのどちらの状態でも共有される。作成後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCore {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub duration: RentalDuration,
    pub started_at: DateTime<Utc>,
}

impl LoanCore {
    /// 返却予定日時（開始日時 + 貸出日数）
    pub fn due_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::days(i64::from(self.duration.days()))
    }
}

/// 貸出中状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnLoan {
    #[serde(flatten)]
    pub core: LoanCore,
}

impl std::ops::Deref for OnLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - returned_atが必須（型で保証）
/// - 終端状態。貸出中へ戻ることも、返却日時が変わることもない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
    pub returned_at: DateTime<Utc>,
}

impl std::ops::Deref for ReturnedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 貸出記録（状態の統合型）
///
/// 「返却日時がNULLなら貸出中」という暗黙の約束ではなく、
/// 2つの状態を明示的なタグとして持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Loan {
    OnLoan(OnLoan),
    Returned(ReturnedLoan),
}

impl Loan {
    /// 永続化された行から状態を復元する
    pub fn from_parts(core: LoanCore, returned_at: Option<DateTime<Utc>>) -> Self {
        match returned_at {
            None => Loan::OnLoan(OnLoan { core }),
            Some(returned_at) => Loan::Returned(ReturnedLoan { core, returned_at }),
        }
    }

    pub fn core(&self) -> &LoanCore {
        match self {
            Loan::OnLoan(on_loan) => &on_loan.core,
            Loan::Returned(returned) => &returned.core,
        }
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Loan::OnLoan(_) => None,
            Loan::Returned(returned) => Some(returned.returned_at),
        }
    }

    pub fn is_on_loan(&self) -> bool {
        matches!(self, Loan::OnLoan(_))
    }
}

/// 純粋関数：書籍を借りる
///
/// 新しいIDと開始日時を持つ貸出中の記録を作る。
/// 在庫の確保は貸出エンジンが同じトランザクション内で行う。
pub fn borrow_book(
    book_id: BookId,
    borrower_id: BorrowerId,
    duration: RentalDuration,
    started_at: DateTime<Utc>,
) -> OnLoan {
    OnLoan {
        core: LoanCore {
            loan_id: LoanId::new(),
            book_id,
            borrower_id,
            duration,
            started_at,
        },
    }
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 借り手本人のみ返却できる
/// - 返却済みの記録は再度返却できない
pub fn return_book(
    loan: Loan,
    requester: BorrowerId,
    returned_at: DateTime<Utc>,
) -> Result<ReturnedLoan, ReturnBookError> {
    if loan.core().borrower_id != requester {
        return Err(ReturnBookError::NotBorrower);
    }

    match loan {
        Loan::OnLoan(on_loan) => Ok(ReturnedLoan {
            core: on_loan.core,
            returned_at,
        }),
        Loan::Returned(_) => Err(ReturnBookError::AlreadyReturned),
    }
}
