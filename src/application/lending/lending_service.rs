use crate::domain::{
    self,
    commands::{CreateLending, FinishLending, RenewLending},
    loan::Loan,
    value_objects::{BookId, LoanId, UserId},
};
use crate::ports::{BookService, BookServiceError, LoanRepository};
use chrono::Utc;
use std::sync::Arc;

use super::errors::{LendingError, Result};
use super::saga_stream::SnapshotEmitter;

/// 在庫0のときのエラーメッセージ
pub const STOCK_EMPTY_MESSAGE: &str = "book stock is empty";

/// サービスの依存関係
///
/// 振る舞いは持たず、各ユースケース関数に明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_repository: Arc<dyn LoanRepository>,
    pub book_service: Arc<dyn BookService>,
}

/// 補償の結果
#[derive(Debug)]
pub enum Compensation {
    /// 在庫に変更が適用されていないため補償不要
    NotRequired,
    /// 予約した在庫を戻した（戻した後の在庫数）
    Released { stock: i32 },
    /// 在庫を戻せなかった
    Failed { error: BookServiceError },
}

/// 貸出サーガの結果
///
/// DRAFTの貸出を作成した後の結末を表す。
#[derive(Debug)]
pub enum SagaOutcome {
    /// 在庫予約と貸出の有効化に成功
    Completed { loan: Loan },
    /// 途中で失敗した
    ///
    /// `loan`は通常CANCELED。補償自体が失敗した場合のみDRAFTのまま。
    Aborted {
        loan: Loan,
        cause: LendingError,
        compensation: Compensation,
    },
}

impl SagaOutcome {
    pub fn loan(&self) -> &Loan {
        match self {
            SagaOutcome::Completed { loan } | SagaOutcome::Aborted { loan, .. } => loan,
        }
    }

    /// 呼び出し側向けの結果に変換する
    ///
    /// 補償失敗は`CompensationFailed`、それ以外の中断は元の原因を返す。
    pub fn into_result(self) -> Result<Loan> {
        match self {
            SagaOutcome::Completed { loan } => Ok(loan),
            SagaOutcome::Aborted {
                loan,
                compensation: Compensation::Failed { error },
                ..
            } => Err(LendingError::CompensationFailed {
                loan_id: loan.id,
                book_id: loan.book_id,
                source: error,
            }),
            SagaOutcome::Aborted { cause, .. } => Err(cause),
        }
    }
}

/// リポジトリから貸出を読み込むヘルパー関数
async fn load_loan(repository: &Arc<dyn LoanRepository>, loan_id: LoanId) -> Result<Loan> {
    repository
        .find_by_id(loan_id)
        .await
        .map_err(LendingError::Repository)?
        .ok_or(LendingError::LoanNotFound(loan_id))
}

/// DRAFTの貸出をCANCELEDにして保存・配信する
async fn cancel_draft(
    deps: &ServiceDependencies,
    draft: &Loan,
    cause: LendingError,
    compensation: Compensation,
    emitter: &SnapshotEmitter,
) -> Result<SagaOutcome> {
    let canceled = domain::loan::cancel(draft, Utc::now())?;

    if let Err(e) = deps.loan_repository.update(&canceled).await {
        tracing::error!(
            loan_id = %draft.id,
            cause = %cause,
            error = %e,
            "failed to cancel draft loan"
        );
        return Err(LendingError::Repository(e));
    }

    tracing::info!(loan_id = %canceled.id, cause = %cause, "loan canceled");
    emitter.emit(&canceled).await;

    Ok(SagaOutcome::Aborted {
        loan: canceled,
        cause,
        compensation,
    })
}

/// 書籍を貸し出す（貸出サーガ）
///
/// 1. 利用者ID・書籍IDの形式を検証する
/// 2. 在庫を問い合わせ、0なら貸出を作らずに`ResourceExhausted`
/// 3. DRAFTの貸出を保存して配信する（ここでIDが採番される）
/// 4. 在庫を-1調整する
///    - 成功：ACTIVEにして保存・配信
///    - 失敗：CANCELEDにして保存・配信し、原因を返す
/// 5. ACTIVEの保存に失敗した場合は在庫を+1して補償し、CANCELEDにする。
///    補償自体が失敗した場合は回復不能として報告する
///
/// # 戻り値
/// - `Err`: DRAFT作成前の失敗、またはCANCELEDの保存に失敗した場合
/// - `Ok(SagaOutcome)`: DRAFT作成後の結末
///
/// # 冪等性
///
/// **警告**: 冪等ではない。タイムアウト後の再試行は在庫を二重に予約しうる。
/// 呼び出し側はタイムアウトを曖昧な結果として扱い、照会で突合すること。
#[tracing::instrument(skip_all, fields(book_id = %cmd.book_id, user_id = %cmd.user_id))]
pub async fn create_lending(
    deps: &ServiceDependencies,
    cmd: CreateLending,
    emitter: &SnapshotEmitter,
) -> Result<SagaOutcome> {
    // 1. 形式検証
    let user_id = UserId::parse(&cmd.user_id)?;
    let book_id = BookId::parse(&cmd.book_id)?;

    // 2. 在庫の事前確認
    let stock = deps.book_service.find_stock(book_id).await?;
    if stock <= 0 {
        return Err(LendingError::ResourceExhausted(
            STOCK_EMPTY_MESSAGE.to_string(),
        ));
    }

    // 3. DRAFTの貸出を保存
    let draft = deps
        .loan_repository
        .create(domain::loan::draft_loan(book_id, user_id, Utc::now()))
        .await
        .map_err(LendingError::Repository)?;

    tracing::info!(loan_id = %draft.id, "draft loan created");
    emitter.emit(&draft).await;

    // 4. 在庫の予約
    if let Err(e) = deps.book_service.adjust_stock(book_id, -1).await {
        tracing::warn!(loan_id = %draft.id, error = %e, "stock reservation failed");
        return cancel_draft(
            deps,
            &draft,
            LendingError::from(e),
            Compensation::NotRequired,
            emitter,
        )
        .await;
    }

    let active = domain::loan::activate(&draft, Utc::now())?;
    let persist_error = match deps.loan_repository.update(&active).await {
        Ok(()) => {
            tracing::info!(loan_id = %active.id, "loan activated");
            emitter.emit(&active).await;
            return Ok(SagaOutcome::Completed { loan: active });
        }
        Err(e) => e,
    };

    // 5. 補償：予約した在庫を戻す
    tracing::error!(
        loan_id = %draft.id,
        error = %persist_error,
        "failed to activate loan, releasing reserved stock"
    );
    let cause = LendingError::Repository(persist_error);

    match deps.book_service.adjust_stock(book_id, 1).await {
        Ok(stock) => {
            cancel_draft(
                deps,
                &draft,
                cause,
                Compensation::Released { stock },
                emitter,
            )
            .await
        }
        Err(error) => {
            tracing::error!(
                loan_id = %draft.id,
                book_id = %book_id,
                error = %error,
                "compensation failed, reserved stock was not released"
            );
            Ok(SagaOutcome::Aborted {
                loan: draft,
                cause,
                compensation: Compensation::Failed { error },
            })
        }
    }
}

/// 貸出を終了する（返却）
///
/// ACTIVEの貸出をINACTIVEにして保存した後、在庫を+1する。
/// 在庫の戻しに失敗した場合は`StockReleaseFailed`を返すが、
/// 自動では再試行も補償もしない。
#[tracing::instrument(skip_all, fields(loan_id = %cmd.loan_id))]
pub async fn finish_lending(deps: &ServiceDependencies, cmd: FinishLending) -> Result<Loan> {
    let loan = load_loan(&deps.loan_repository, cmd.loan_id).await?;
    let finished = domain::loan::finish(&loan, Utc::now())?;

    deps.loan_repository
        .update(&finished)
        .await
        .map_err(LendingError::Repository)?;

    if let Err(e) = deps.book_service.adjust_stock(finished.book_id, 1).await {
        tracing::error!(
            loan_id = %finished.id,
            book_id = %finished.book_id,
            error = %e,
            "loan finished but stock was not released, reconciliation required"
        );
        return Err(LendingError::StockReleaseFailed {
            loan_id: finished.id,
            book_id: finished.book_id,
            source: e,
        });
    }

    tracing::info!("loan finished");
    Ok(finished)
}

/// 貸出を更新する
///
/// 返却期限を「現在時刻 + 14日」に再設定する。在庫には触れない。
/// 終端状態の貸出でも拒否はしない。
#[tracing::instrument(skip_all, fields(loan_id = %cmd.loan_id))]
pub async fn renew_lending(deps: &ServiceDependencies, cmd: RenewLending) -> Result<Loan> {
    let loan = load_loan(&deps.loan_repository, cmd.loan_id).await?;

    if loan.status.is_terminal() {
        tracing::warn!(status = %loan.status, "renewing a loan in a terminal status");
    }

    let renewed = domain::loan::renew(&loan, Utc::now());
    deps.loan_repository
        .update(&renewed)
        .await
        .map_err(LendingError::Repository)?;

    Ok(renewed)
}

/// IDで貸出を取得する
///
/// タイムアウトなど結果が曖昧な呼び出しの後の突合に使う。
pub async fn get_lending(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    load_loan(&deps.loan_repository, loan_id).await
}
