mod common;

use book_rental::adapters::memory::MemoryStore;
use book_rental::application::rental::{
    RentalApplicationError, ServiceDependencies, borrow_book, get_loan, list_all_history,
    list_borrower_history, return_book,
};
use book_rental::domain::commands::{BorrowBook, ReturnBook};
use book_rental::domain::loan::Loan;
use book_rental::domain::value_objects::{BookId, BorrowerId, LoanId};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn borrow_cmd(book_id: BookId, borrower_id: BorrowerId, days: i32) -> BorrowBook {
    BorrowBook {
        book_id,
        borrower_id,
        duration_days: days,
        requested_at: Utc::now(),
    }
}

fn return_cmd(loan_id: LoanId, borrower_id: BorrowerId) -> ReturnBook {
    ReturnBook {
        loan_id,
        borrower_id,
        returned_at: Utc::now(),
    }
}

async fn setup(quantity: i32) -> (Arc<MemoryStore>, ServiceDependencies, BookId) {
    let store = Arc::new(MemoryStore::new());
    let deps = common::memory_dependencies(&store);
    let book_id = common::seed_book(&store, "The Rust Programming Language", quantity).await;
    (store, deps, book_id)
}

// ============================================================================
// 貸出
// ============================================================================

#[tokio::test]
async fn test_borrow_book_success() {
    let (store, deps, book_id) = setup(2).await;
    let borrower_id = BorrowerId::new();

    let loan_id = borrow_book(&deps, borrow_cmd(book_id, borrower_id, 7))
        .await
        .unwrap();

    // 在庫が1減ったことを確認
    assert_eq!(store.available_quantity(book_id).await, Some(1));

    // 貸出中の記録が追加されたことを確認
    let loan = get_loan(&deps, loan_id).await.unwrap();
    assert!(loan.is_on_loan());
    assert_eq!(loan.core().book_id, book_id);
    assert_eq!(loan.core().borrower_id, borrower_id);
    assert_eq!(loan.core().duration.days(), 7);
}

#[tokio::test]
async fn test_borrow_book_rejects_out_of_range_duration() {
    let (store, deps, book_id) = setup(1).await;

    for days in [0, 31, -1] {
        let result = borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), days)).await;
        assert!(matches!(
            result.unwrap_err(),
            RentalApplicationError::Validation(_)
        ));
    }

    // 在庫も台帳も変化しない
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    assert!(list_all_history(&deps).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_book_not_found() {
    let (_store, deps, _book_id) = setup(1).await;

    let result = borrow_book(&deps, borrow_cmd(BookId::new(), BorrowerId::new(), 7)).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::BookNotFound
    ));
}

#[tokio::test]
async fn test_borrow_book_not_available_when_out_of_stock() {
    let (store, deps, book_id) = setup(0).await;

    let result = borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), 7)).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::NotAvailable
    ));
    assert_eq!(store.available_quantity(book_id).await, Some(0));
    assert!(list_all_history(&deps).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_book_rolls_back_when_insert_fails() {
    let (store, deps, book_id) = setup(1).await;
    store.fail_loan_inserts(true);

    let result = borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), 7)).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::StoreFailure(_)
    ));
    // 在庫の減算も取り消されている
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    assert!(list_all_history(&deps).await.unwrap().is_empty());

    // 障害が解消すれば再試行で成功する
    store.fail_loan_inserts(false);
    assert!(
        borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), 7))
            .await
            .is_ok()
    );
    assert_eq!(store.available_quantity(book_id).await, Some(0));
}

#[tokio::test]
async fn test_borrow_book_timeout_rolls_back() {
    let (store, mut deps, book_id) = setup(1).await;
    deps.operation_timeout = Duration::from_millis(50);
    store.set_statement_delay(Duration::from_millis(40));

    let result = borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), 7)).await;

    assert!(matches!(result.unwrap_err(), RentalApplicationError::Timeout));

    store.set_statement_delay(Duration::ZERO);
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    assert!(list_all_history(&deps).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_never_over_allocate() {
    const STOCK: i32 = 5;
    const EXTRA: usize = 7;
    let (store, deps, book_id) = setup(STOCK).await;

    let handles: Vec<_> = (0..STOCK as usize + EXTRA)
        .map(|_| {
            let deps = deps.clone();
            tokio::spawn(async move {
                borrow_book(&deps, borrow_cmd(book_id, BorrowerId::new(), 7)).await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let not_available = results
        .iter()
        .filter(|r| matches!(r, Err(RentalApplicationError::NotAvailable)))
        .count();

    assert_eq!(successes, STOCK as usize);
    assert_eq!(not_available, EXTRA);
    assert_eq!(store.available_quantity(book_id).await, Some(0));
    assert_eq!(list_all_history(&deps).await.unwrap().len(), STOCK as usize);
}

// ============================================================================
// 返却
// ============================================================================

#[tokio::test]
async fn test_return_book_success() {
    let (store, deps, book_id) = setup(1).await;
    let borrower_id = BorrowerId::new();
    let loan_id = borrow_book(&deps, borrow_cmd(book_id, borrower_id, 7))
        .await
        .unwrap();

    let returned = return_book(&deps, return_cmd(loan_id, borrower_id))
        .await
        .unwrap();

    assert_eq!(returned.loan_id, loan_id);
    assert_eq!(store.available_quantity(book_id).await, Some(1));

    let loan = get_loan(&deps, loan_id).await.unwrap();
    assert_eq!(loan.returned_at(), Some(returned.returned_at));
}

#[tokio::test]
async fn test_return_book_twice_yields_already_returned() {
    let (store, deps, book_id) = setup(1).await;
    let borrower_id = BorrowerId::new();
    let loan_id = borrow_book(&deps, borrow_cmd(book_id, borrower_id, 7))
        .await
        .unwrap();

    let first = return_book(&deps, return_cmd(loan_id, borrower_id))
        .await
        .unwrap();
    let second = return_book(&deps, return_cmd(loan_id, borrower_id)).await;

    assert!(matches!(
        second.unwrap_err(),
        RentalApplicationError::AlreadyReturned
    ));
    // 在庫は1回分しか戻らず、返却日時も変わらない
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    let loan = get_loan(&deps, loan_id).await.unwrap();
    assert_eq!(loan.returned_at(), Some(first.returned_at));
}

#[tokio::test]
async fn test_return_book_by_other_borrower_is_unauthorized() {
    let (store, deps, book_id) = setup(1).await;
    let owner = BorrowerId::new();
    let loan_id = borrow_book(&deps, borrow_cmd(book_id, owner, 7))
        .await
        .unwrap();

    let result = return_book(&deps, return_cmd(loan_id, BorrowerId::new())).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::Unauthorized
    ));
    // 状態は変わらない
    assert_eq!(store.available_quantity(book_id).await, Some(0));
    assert!(get_loan(&deps, loan_id).await.unwrap().is_on_loan());
}

#[tokio::test]
async fn test_return_book_unknown_loan() {
    let (_store, deps, _book_id) = setup(1).await;

    let result = return_book(&deps, return_cmd(LoanId::new(), BorrowerId::new())).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::LoanNotFound
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_increment_once() {
    let (store, deps, book_id) = setup(1).await;
    let borrower_id = BorrowerId::new();
    let loan_id = borrow_book(&deps, borrow_cmd(book_id, borrower_id, 7))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let deps = deps.clone();
            tokio::spawn(async move { return_book(&deps, return_cmd(loan_id, borrower_id)).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(RentalApplicationError::AlreadyReturned)))
    );
    assert_eq!(store.available_quantity(book_id).await, Some(1));
}

#[tokio::test]
async fn test_return_race_lost_at_conditional_update() {
    let (store, deps, book_id) = setup(1).await;
    let borrower_id = BorrowerId::new();
    let loan_id = borrow_book(&deps, borrow_cmd(book_id, borrower_id, 7))
        .await
        .unwrap();
    let first = return_book(&deps, return_cmd(loan_id, borrower_id))
        .await
        .unwrap();

    // 先行する返却が確定する前に読んだ状態を再現する
    store.stale_loan_reads(true);
    let result = return_book(&deps, return_cmd(loan_id, borrower_id)).await;
    store.stale_loan_reads(false);

    // 条件付き更新が0行となりAlreadyReturnedで中止される
    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::AlreadyReturned
    ));
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    let loan = get_loan(&deps, loan_id).await.unwrap();
    assert_eq!(loan.returned_at(), Some(first.returned_at));
}

// ============================================================================
// 具体シナリオ：在庫1冊を2人が同時に借りる
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_borrowers_race_for_last_copy() {
    let (store, deps, book_id) = setup(1).await;
    let u1 = BorrowerId::new();
    let u2 = BorrowerId::new();

    let (r1, r2) = tokio::join!(
        borrow_book(&deps, borrow_cmd(book_id, u1, 7)),
        borrow_book(&deps, borrow_cmd(book_id, u2, 7)),
    );

    let (winner, loan_id, loser_result) = match (r1, r2) {
        (Ok(id), other) => (u1, id, other),
        (other, Ok(id)) => (u2, id, other),
        (Err(e1), Err(e2)) => panic!("both borrows failed: {e1:?}, {e2:?}"),
    };
    assert!(matches!(
        loser_result.unwrap_err(),
        RentalApplicationError::NotAvailable
    ));
    assert_eq!(store.available_quantity(book_id).await, Some(0));

    // 勝者が返却すると在庫は1に戻る
    return_book(&deps, return_cmd(loan_id, winner))
        .await
        .unwrap();
    assert_eq!(store.available_quantity(book_id).await, Some(1));
    assert!(get_loan(&deps, loan_id).await.unwrap().returned_at().is_some());

    // 2回目の返却はAlreadyReturnedで、在庫は1のまま
    let repeat = return_book(&deps, return_cmd(loan_id, winner)).await;
    assert!(matches!(
        repeat.unwrap_err(),
        RentalApplicationError::AlreadyReturned
    ));
    assert_eq!(store.available_quantity(book_id).await, Some(1));
}

#[tokio::test]
async fn test_borrow_and_return_cycles_net_to_zero() {
    let (store, deps, book_id) = setup(3).await;
    let borrower_id = BorrowerId::new();

    let mut loan_ids = Vec::new();
    for _ in 0..3 {
        loan_ids.push(
            borrow_book(&deps, borrow_cmd(book_id, borrower_id, 14))
                .await
                .unwrap(),
        );
    }
    assert_eq!(store.available_quantity(book_id).await, Some(0));

    for loan_id in loan_ids {
        return_book(&deps, return_cmd(loan_id, borrower_id))
            .await
            .unwrap();
    }

    assert_eq!(store.available_quantity(book_id).await, Some(3));
    assert!(
        list_all_history(&deps)
            .await
            .unwrap()
            .iter()
            .all(|loan| loan.returned_at().is_some())
    );
}

// ============================================================================
// 履歴
// ============================================================================

#[tokio::test]
async fn test_borrower_history_joins_book_names() {
    let store = Arc::new(MemoryStore::new());
    let deps = common::memory_dependencies(&store);
    let dune = common::seed_book(&store, "Dune", 1).await;
    let emma = common::seed_book(&store, "Emma", 1).await;
    let borrower_id = BorrowerId::new();
    let someone_else = BorrowerId::new();

    borrow_book(&deps, borrow_cmd(dune, borrower_id, 7))
        .await
        .unwrap();
    borrow_book(&deps, borrow_cmd(emma, someone_else, 7))
        .await
        .unwrap();

    let history = list_borrower_history(&deps, borrower_id).await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].book_name, "Dune");
    assert_eq!(history[0].loan.core().borrower_id, borrower_id);
    assert_eq!(list_all_history(&deps).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_is_ordered_by_start_time() {
    let (_store, deps, book_id) = setup(3).await;
    let borrower_id = BorrowerId::new();
    let base = Utc::now();

    for offset in [2, 0, 1] {
        let cmd = BorrowBook {
            book_id,
            borrower_id,
            duration_days: 7,
            requested_at: base + chrono::Duration::minutes(offset),
        };
        borrow_book(&deps, cmd).await.unwrap();
    }

    let starts: Vec<_> = list_all_history(&deps)
        .await
        .unwrap()
        .iter()
        .map(|loan: &Loan| loan.core().started_at)
        .collect();

    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[tokio::test]
async fn test_history_for_unknown_borrower_is_empty() {
    let (_store, deps, _book_id) = setup(1).await;

    let history = list_borrower_history(&deps, BorrowerId::new()).await.unwrap();

    assert!(history.is_empty());
}

#[tokio::test]
async fn test_get_loan_absent_is_not_found() {
    let (_store, deps, _book_id) = setup(1).await;

    let result = get_loan(&deps, LoanId::new()).await;

    assert!(matches!(
        result.unwrap_err(),
        RentalApplicationError::LoanNotFound
    ));
}
