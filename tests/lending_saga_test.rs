use futures::StreamExt;
use rusty_library_lending::application::ErrorCode;
use rusty_library_lending::application::stock::RetryPolicy;
use rusty_library_lending::application::lending::{
    Compensation, LendingError, SagaFrame, SagaOutcome, SnapshotEmitter, create_lending,
    create_lending_stream, finish_lending, get_lending, renew_lending,
};
use rusty_library_lending::domain::commands::{CreateLending, FinishLending, RenewLending};
use rusty_library_lending::domain::loan::{Loan, LoanStatus};
use rusty_library_lending::domain::value_objects::{BookId, LoanId, UserId};
use std::time::Duration;

mod common;

use common::TestLending;

fn command(book_id: BookId) -> CreateLending {
    CreateLending {
        book_id: book_id.to_string(),
        user_id: UserId::new().to_string(),
    }
}

async fn run_saga(env: &TestLending, cmd: CreateLending) -> Result<SagaOutcome, LendingError> {
    create_lending(&env.deps, cmd, &SnapshotEmitter::discard()).await
}

async fn active_loan(env: &TestLending, book_id: BookId) -> Loan {
    run_saga(env, command(book_id))
        .await
        .expect("saga should run")
        .into_result()
        .expect("loan should be active")
}

fn statuses(frames: &[SagaFrame]) -> Vec<LoanStatus> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            SagaFrame::Snapshot(loan) => Some(loan.status),
            SagaFrame::Failed(_) => None,
        })
        .collect()
}

// ============================================================================
// 貸出サーガ
// ============================================================================

#[tokio::test]
async fn test_create_lending_reserves_stock_and_activates() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);

    let outcome = run_saga(&env, command(book_id)).await.unwrap();

    let loan = match outcome {
        SagaOutcome::Completed { loan } => loan,
        other => panic!("expected completion, got {:?}", other),
    };
    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(loan.book_id, book_id);
    assert_eq!(env.stock_of(book_id), 0);

    let stored = env.loans.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, LoanStatus::Active);
}

#[tokio::test]
async fn test_stream_emits_draft_then_active() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(2);

    let frames: Vec<SagaFrame> = create_lending_stream(env.deps.clone(), command(book_id))
        .collect()
        .await;

    assert_eq!(statuses(&frames), vec![LoanStatus::Draft, LoanStatus::Active]);
    assert!(!frames.iter().any(|f| matches!(f, SagaFrame::Failed(_))));

    let ids: Vec<LoanId> = frames
        .iter()
        .filter_map(|f| match f {
            SagaFrame::Snapshot(loan) => Some(loan.id),
            SagaFrame::Failed(_) => None,
        })
        .collect();
    assert_eq!(ids[0], ids[1]);
    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_empty_stock_creates_no_loan() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(0);

    let frames: Vec<SagaFrame> = create_lending_stream(env.deps.clone(), command(book_id))
        .collect()
        .await;

    assert_eq!(frames.len(), 1);
    match &frames[0] {
        SagaFrame::Failed(err) => {
            assert_eq!(err.code(), ErrorCode::ResourceExhausted);
            assert_eq!(err.to_string(), "book stock is empty");
        }
        other => panic!("expected failure frame, got {:?}", other),
    }
    assert!(env.loans.all().is_empty());
    assert_eq!(env.stock_of(book_id), 0);
}

#[tokio::test]
async fn test_malformed_identifiers_are_rejected_before_any_call() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);

    let bad_user = CreateLending {
        book_id: book_id.to_string(),
        user_id: "not-a-uuid".to_string(),
    };
    let err = run_saga(&env, bad_user).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let bad_book = CreateLending {
        book_id: String::new(),
        user_id: UserId::new().to_string(),
    };
    let err = run_saga(&env, bad_book).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    assert!(env.loans.all().is_empty());
    assert_eq!(env.ledger.cas_calls(), 0);
}

#[tokio::test]
async fn test_unknown_book_is_not_found() {
    let env = TestLending::new();

    let err = run_saga(&env, command(BookId::new())).await.unwrap_err();

    assert!(matches!(err, LendingError::BookNotFound(_)));
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(env.loans.all().is_empty());
}

#[tokio::test]
async fn test_reservation_conflict_cancels_draft() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.ledger.force_conflicts(3);

    let frames: Vec<SagaFrame> = create_lending_stream(env.deps.clone(), command(book_id))
        .collect()
        .await;

    assert_eq!(
        statuses(&frames),
        vec![LoanStatus::Draft, LoanStatus::Canceled]
    );
    match frames.last() {
        Some(SagaFrame::Failed(err)) => assert_eq!(err.code(), ErrorCode::Conflict),
        other => panic!("expected failure frame, got {:?}", other),
    }

    assert_eq!(env.loans.all()[0].status, LoanStatus::Canceled);
    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_concurrent_sagas_on_last_copy() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);

    let (first, second) = tokio::join!(
        run_saga(&env, command(book_id)),
        run_saga(&env, command(book_id))
    );

    let completed = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Ok(SagaOutcome::Completed { .. })))
        .count();
    assert_eq!(completed, 1);

    for result in [first, second] {
        match result {
            Ok(SagaOutcome::Completed { .. }) => {}
            Ok(SagaOutcome::Aborted {
                loan,
                cause,
                compensation,
            }) => {
                assert_eq!(loan.status, LoanStatus::Canceled);
                assert!(matches!(
                    cause.code(),
                    ErrorCode::ResourceExhausted | ErrorCode::Conflict
                ));
                assert!(matches!(compensation, Compensation::NotRequired));
            }
            Err(err) => assert_eq!(err.code(), ErrorCode::ResourceExhausted),
        }
    }

    let active = env
        .loans
        .all()
        .into_iter()
        .filter(|l| l.status == LoanStatus::Active)
        .count();
    assert_eq!(active, 1);
    assert_eq!(env.stock_of(book_id), 0);
}

#[tokio::test]
async fn test_activation_failure_releases_reserved_stock() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.loans.fail_update_to(LoanStatus::Active);

    let outcome = run_saga(&env, command(book_id)).await.unwrap();

    match &outcome {
        SagaOutcome::Aborted {
            loan, compensation, ..
        } => {
            assert_eq!(loan.status, LoanStatus::Canceled);
            assert!(matches!(compensation, Compensation::Released { stock: 1 }));
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(env.stock_of(book_id), 1);
    assert_eq!(env.loans.all()[0].status, LoanStatus::Canceled);

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, LendingError::Repository(_)));
    assert_eq!(err.code(), ErrorCode::Internal);
}

#[tokio::test]
async fn test_failed_compensation_is_reported() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.loans.fail_update_to(LoanStatus::Active);
    env.book_service.fail_releases(true);

    let outcome = run_saga(&env, command(book_id)).await.unwrap();

    match &outcome {
        SagaOutcome::Aborted {
            loan, compensation, ..
        } => {
            assert_eq!(loan.status, LoanStatus::Draft);
            assert!(matches!(compensation, Compensation::Failed { .. }));
        }
        other => panic!("expected abort, got {:?}", other),
    }
    // 予約された在庫は戻らず、貸出はDRAFTのまま残る
    assert_eq!(env.stock_of(book_id), 0);
    assert_eq!(env.loans.all()[0].status, LoanStatus::Draft);

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, LendingError::CompensationFailed { .. }));
    assert_eq!(err.code(), ErrorCode::Internal);
}

#[tokio::test]
async fn test_failed_compensation_stream_ends_with_error() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.loans.fail_update_to(LoanStatus::Active);
    env.book_service.fail_releases(true);

    let frames: Vec<SagaFrame> = create_lending_stream(env.deps.clone(), command(book_id))
        .collect()
        .await;

    assert_eq!(statuses(&frames), vec![LoanStatus::Draft]);
    assert!(matches!(
        frames.last(),
        Some(SagaFrame::Failed(LendingError::CompensationFailed { .. }))
    ));
}

#[tokio::test]
async fn test_dropping_stream_abandons_saga_without_compensation() {
    let env = TestLending::with_policy(RetryPolicy {
        max_attempts: 100,
        delay: Duration::from_millis(100),
    });
    let book_id = env.book_with_stock(1);
    env.ledger.force_conflicts(100);

    let mut stream = create_lending_stream(env.deps.clone(), command(book_id));
    match stream.next().await {
        Some(SagaFrame::Snapshot(loan)) => assert_eq!(loan.status, LoanStatus::Draft),
        other => panic!("expected draft snapshot, got {:?}", other),
    }

    // 呼び出し側の切断
    drop(stream);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls_after_drop = env.ledger.cas_calls();

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(env.ledger.cas_calls(), calls_after_drop);
    assert!(calls_after_drop <= 1);

    let stored = env.loans.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, LoanStatus::Draft);
    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_cancel_persistence_failure_is_returned() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.ledger.force_conflicts(3);
    env.loans.fail_update_to(LoanStatus::Canceled);

    let err = run_saga(&env, command(book_id)).await.unwrap_err();

    assert!(matches!(err, LendingError::Repository(_)));
    assert_eq!(env.loans.all()[0].status, LoanStatus::Draft);
}

#[tokio::test]
async fn test_draft_creation_failure_touches_no_stock() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.loans.fail_create(true);

    let err = run_saga(&env, command(book_id)).await.unwrap_err();

    assert!(matches!(err, LendingError::Repository(_)));
    assert_eq!(env.stock_of(book_id), 1);
    assert_eq!(env.ledger.cas_calls(), 0);
}

// ============================================================================
// 返却・更新・照会
// ============================================================================

#[tokio::test]
async fn test_finish_lending_releases_stock() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let loan = active_loan(&env, book_id).await;
    assert_eq!(env.stock_of(book_id), 0);

    let finished = finish_lending(&env.deps, FinishLending { loan_id: loan.id })
        .await
        .unwrap();

    assert_eq!(finished.status, LoanStatus::Inactive);
    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_finishing_twice_is_a_failed_precondition() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let loan = active_loan(&env, book_id).await;

    finish_lending(&env.deps, FinishLending { loan_id: loan.id })
        .await
        .unwrap();
    let err = finish_lending(&env.deps, FinishLending { loan_id: loan.id })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::FailedPrecondition);
    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_finish_release_failure_keeps_loan_inactive() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let loan = active_loan(&env, book_id).await;
    env.book_service.fail_releases(true);

    let err = finish_lending(&env.deps, FinishLending { loan_id: loan.id })
        .await
        .unwrap_err();

    assert!(matches!(err, LendingError::StockReleaseFailed { .. }));
    assert_eq!(env.stock_of(book_id), 0);

    let stored = get_lending(&env.deps, loan.id).await.unwrap();
    assert_eq!(stored.status, LoanStatus::Inactive);
}

#[tokio::test]
async fn test_finished_copy_can_be_lent_again() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);

    let first = active_loan(&env, book_id).await;
    assert_eq!(env.stock_of(book_id), 0);

    finish_lending(&env.deps, FinishLending { loan_id: first.id })
        .await
        .unwrap();
    assert_eq!(env.stock_of(book_id), 1);

    let second = active_loan(&env, book_id).await;
    assert_ne!(second.id, first.id);
    assert_eq!(env.stock_of(book_id), 0);

    let err = run_saga(&env, command(book_id)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ResourceExhausted);
    assert_eq!(env.stock_of(book_id), 0);

    let mut statuses: Vec<LoanStatus> = env.loans.all().iter().map(|l| l.status).collect();
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(statuses, vec![LoanStatus::Active, LoanStatus::Inactive]);
}

#[tokio::test]
async fn test_finish_unknown_loan() {
    let env = TestLending::new();

    let err = finish_lending(&env.deps, FinishLending { loan_id: LoanId::new() })
        .await
        .unwrap_err();

    assert!(matches!(err, LendingError::LoanNotFound(_)));
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_renew_lending_extends_return_date() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let loan = active_loan(&env, book_id).await;

    let renewed = renew_lending(&env.deps, RenewLending { loan_id: loan.id })
        .await
        .unwrap();

    assert_eq!(renewed.status, LoanStatus::Active);
    assert!(renewed.return_date >= loan.return_date);
    assert_eq!(env.stock_of(book_id), 0);

    let stored = get_lending(&env.deps, loan.id).await.unwrap();
    assert_eq!(stored.return_date, renewed.return_date);
}

#[tokio::test]
async fn test_renew_finished_loan_is_permitted() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let loan = active_loan(&env, book_id).await;
    finish_lending(&env.deps, FinishLending { loan_id: loan.id })
        .await
        .unwrap();

    let renewed = renew_lending(&env.deps, RenewLending { loan_id: loan.id })
        .await
        .unwrap();

    assert_eq!(renewed.status, LoanStatus::Inactive);
}

#[tokio::test]
async fn test_get_lending_not_found() {
    let env = TestLending::new();

    let err = get_lending(&env.deps, LoanId::new()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::NotFound);
}
