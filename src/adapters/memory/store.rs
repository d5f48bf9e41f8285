use crate::domain::{
    book::Book,
    loan::{Loan, OnLoan},
    value_objects::{BookId, BorrowerId, LoanId},
};
use crate::ports::{
    catalog::{self, Catalog, RemoveOutcome},
    loan_history::{self, BorrowerLoanView, LoanHistory},
    rental_ledger::{self, LedgerTransaction, RentalLedger},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// ストアの内容（在庫台帳と貸出台帳）
#[derive(Debug, Clone, Default)]
struct State {
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,
}

impl State {
    fn loans_in_order(&self) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self.loans.values().cloned().collect();
        loans.sort_by_key(|loan| (loan.core().started_at, loan.core().loan_id.value()));
        loans
    }
}

/// 障害注入用の設定（テスト用）
#[derive(Debug, Default)]
struct Faults {
    fail_loan_inserts: AtomicBool,
    stale_loan_reads: AtomicBool,
    statement_delay_ms: AtomicU64,
}

/// インメモリ実装
///
/// 3つのポート（貸出台帳・貸出履歴・カタログ）を1つの状態で実装する。
/// トランザクションは状態全体のロックを保持したまま複製上で作業し、
/// commitで書き戻す。commitせずに破棄された複製はそのまま捨てられる。
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用に書籍を直接登録する
    pub async fn seed_book(&self, book: Book) {
        self.state.lock().await.books.insert(book.book_id, book);
    }

    /// テスト用に在庫数を読む
    pub async fn available_quantity(&self, book_id: BookId) -> Option<i32> {
        self.state
            .lock()
            .await
            .books
            .get(&book_id)
            .map(|book| book.available_quantity)
    }

    /// 以降の貸出記録の追加を失敗させる（ロールバック確認用）
    pub fn fail_loan_inserts(&self, fail: bool) {
        self.faults.fail_loan_inserts.store(fail, Ordering::SeqCst);
    }

    /// 返却済みの貸出記録を貸出中として読ませる
    ///
    /// 別の返却がまだ確定していない時点の読み取りを再現し、
    /// 返却日時の条件付き更新だけが競合を判定する経路を確認する。
    pub fn stale_loan_reads(&self, stale: bool) {
        self.faults.stale_loan_reads.store(stale, Ordering::SeqCst);
    }

    /// トランザクション内の各操作に遅延を入れる（タイムアウト確認用）
    pub fn set_statement_delay(&self, delay: Duration) {
        self.faults
            .statement_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

/// インメモリのトランザクション
struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    staged: State,
    faults: Arc<Faults>,
}

impl MemoryTransaction {
    async fn statement(&self) {
        let delay = self.faults.statement_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl RentalLedger for MemoryStore {
    async fn begin(&self) -> rental_ledger::Result<Box<dyn LedgerTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            faults: self.faults.clone(),
        }))
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn take_copy(&mut self, book_id: BookId) -> rental_ledger::Result<bool> {
        self.statement().await;
        match self.staged.books.get_mut(&book_id) {
            Some(book) if book.available_quantity > 0 => {
                book.available_quantity -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn put_back_copy(&mut self, book_id: BookId) -> rental_ledger::Result<bool> {
        self.statement().await;
        match self.staged.books.get_mut(&book_id) {
            Some(book) => {
                book.available_quantity += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn book_exists(&mut self, book_id: BookId) -> rental_ledger::Result<bool> {
        self.statement().await;
        Ok(self.staged.books.contains_key(&book_id))
    }

    async fn insert_loan(&mut self, loan: &OnLoan) -> rental_ledger::Result<()> {
        self.statement().await;
        if self.faults.fail_loan_inserts.load(Ordering::SeqCst) {
            return Err("injected failure: loan insert".into());
        }
        if !self.staged.books.contains_key(&loan.book_id) {
            return Err(format!("foreign key violation: book {} does not exist", loan.book_id).into());
        }
        if self.staged.loans.contains_key(&loan.loan_id) {
            return Err(format!("unique violation: loan {} already exists", loan.loan_id).into());
        }
        self.staged
            .loans
            .insert(loan.loan_id, Loan::OnLoan(loan.clone()));
        Ok(())
    }

    async fn find_loan(&mut self, loan_id: LoanId) -> rental_ledger::Result<Option<Loan>> {
        self.statement().await;
        let loan = self.staged.loans.get(&loan_id).cloned();
        if !self.faults.stale_loan_reads.load(Ordering::SeqCst) {
            return Ok(loan);
        }
        Ok(loan.map(|loan| Loan::from_parts(loan.core().clone(), None)))
    }

    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> rental_ledger::Result<bool> {
        self.statement().await;
        let Some(loan) = self.staged.loans.get_mut(&loan_id) else {
            return Ok(false);
        };
        let core = match loan {
            Loan::OnLoan(on_loan) if on_loan.borrower_id == borrower_id => on_loan.core.clone(),
            _ => return Ok(false),
        };
        *loan = Loan::from_parts(core, Some(returned_at));
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> rental_ledger::Result<()> {
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> rental_ledger::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl LoanHistory for MemoryStore {
    async fn list_all(&self) -> loan_history::Result<Vec<Loan>> {
        Ok(self.state.lock().await.loans_in_order())
    }

    async fn list_for_borrower(
        &self,
        borrower_id: BorrowerId,
    ) -> loan_history::Result<Vec<BorrowerLoanView>> {
        let state = self.state.lock().await;
        Ok(state
            .loans_in_order()
            .into_iter()
            .filter(|loan| loan.core().borrower_id == borrower_id)
            .filter_map(|loan| {
                let book_name = state.books.get(&loan.core().book_id)?.name.clone();
                Some(BorrowerLoanView { loan, book_name })
            })
            .collect())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> loan_history::Result<Option<Loan>> {
        Ok(self.state.lock().await.loans.get(&loan_id).cloned())
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn insert(&self, book: &Book) -> catalog::Result<()> {
        let mut state = self.state.lock().await;
        if state.books.contains_key(&book.book_id) {
            return Err(format!("unique violation: book {} already exists", book.book_id).into());
        }
        state.books.insert(book.book_id, book.clone());
        Ok(())
    }

    async fn list(&self) -> catalog::Result<Vec<Book>> {
        let mut books: Vec<Book> = self.state.lock().await.books.values().cloned().collect();
        books.sort_by_key(|book| (book.created_at, book.book_id.value()));
        Ok(books)
    }

    async fn get(&self, book_id: BookId) -> catalog::Result<Option<Book>> {
        Ok(self.state.lock().await.books.get(&book_id).cloned())
    }

    async fn rename(&self, book_id: BookId, name: &str) -> catalog::Result<bool> {
        let mut state = self.state.lock().await;
        match state.books.get_mut(&book_id) {
            Some(book) => {
                book.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, book_id: BookId) -> catalog::Result<RemoveOutcome> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&book_id) {
            return Ok(RemoveOutcome::NotFound);
        }
        if state.loans.values().any(|loan| loan.core().book_id == book_id) {
            return Ok(RemoveOutcome::StillReferenced);
        }
        state.books.remove(&book_id);
        Ok(RemoveOutcome::Removed)
    }
}
