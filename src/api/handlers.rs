use crate::application::{
    ErrorCode,
    lending::{
        SagaFrame, ServiceDependencies, create_lending_stream, finish_lending as execute_finish,
        get_lending, renew_lending as execute_renew,
    },
    stock::StockAdjuster,
};
use crate::domain::{
    InvalidIdentifier,
    commands::{AdjustStock, FinishLending, RenewLending},
    value_objects::{BookId, LoanId},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::{convert::Infallible, sync::Arc, time::Duration};

use super::{
    error::ApiError,
    types::{AdjustStockRequest, CreateLendingRequest, LoanResponse, StockResponse},
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    /// このプロセスが書籍サービスとして公開する在庫台帳
    pub stock_adjuster: Arc<StockAdjuster>,
}

fn invalid_argument(err: InvalidIdentifier) -> ApiError {
    ApiError::Request(ErrorCode::InvalidArgument, err.to_string())
}

/// 本文のJSONが解釈できない場合もエラー本文の形式をそろえる
fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::Request(ErrorCode::InvalidArgument, rejection.body_text())
}

// ============================================================================
// Lending handlers
// ============================================================================

/// POST /loans - 貸出を作成（サーガ）
///
/// 貸出のスナップショットを`loan`イベントとしてServer-Sent Eventsで流す。
/// 成功時はDRAFT、ACTIVEの順。補償が走った場合はDRAFT、CANCELEDの順。
/// 失敗した場合は最後に`error`イベントを1つ送って閉じる。
///
/// 識別子の形式不正もストリーム上の`error`イベントとして返す。
/// 本文がJSONとして解釈できない場合だけは、ストリームを開かずに400を返す。
/// クライアントが切断するとサーガは次の待機点で中断される。
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLendingRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let Json(req) = payload.map_err(invalid_body)?;

    let frames = create_lending_stream(state.service_deps.clone(), req.to_command());
    let events = frames.map(|frame| Ok(saga_event(frame)));

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

fn saga_event(frame: SagaFrame) -> SseEvent {
    let (name, payload) = match frame {
        SagaFrame::Snapshot(loan) => ("loan", serde_json::to_string(&LoanResponse::from(loan))),
        SagaFrame::Failed(err) => ("error", serde_json::to_string(&ApiError::from(err).body())),
    };

    match payload {
        Ok(json_str) => SseEvent::default().event(name).data(json_str),
        Err(e) => {
            tracing::error!("Failed to serialize saga frame: {}", e);
            SseEvent::default()
                .event("error")
                .data(r#"{"error":"INTERNAL","message":"An unexpected error occurred"}"#)
        }
    }
}

/// GET /loans/:id - 貸出をIDで取得
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = LoanId::parse(&loan_id).map_err(invalid_argument)?;
    let loan = get_lending(&state.service_deps, loan_id).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/finish - 貸出を終了（返却）
///
/// ACTIVEの貸出をINACTIVEにし、在庫を1戻す。
pub async fn finish_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = LoanId::parse(&loan_id).map_err(invalid_argument)?;
    let loan = execute_finish(&state.service_deps, FinishLending { loan_id }).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/renew - 貸出を更新
///
/// 返却期限を現在時刻から14日後に設定し直す。
pub async fn renew_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = LoanId::parse(&loan_id).map_err(invalid_argument)?;
    let loan = execute_renew(&state.service_deps, RenewLending { loan_id }).await?;
    Ok(Json(LoanResponse::from(loan)))
}

// ============================================================================
// Stock handlers (book service)
// ============================================================================

/// GET /books/:id/stock - 在庫数を取得
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let book_id = BookId::parse(&book_id).map_err(invalid_argument)?;
    let record = state.stock_adjuster.find_stock(book_id).await?;
    Ok(Json(StockResponse::new(record.book_id, record.stock)))
}

/// POST /books/:id/stock - 在庫を調整
///
/// 変化量0はINVALID_ARGUMENT、在庫が負になる調整はRESOURCE_EXHAUSTED。
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    payload: Result<Json<AdjustStockRequest>, JsonRejection>,
) -> Result<Json<StockResponse>, ApiError> {
    let Json(req) = payload.map_err(invalid_body)?;
    let cmd = AdjustStock {
        book_id: BookId::parse(&book_id).map_err(invalid_argument)?,
        delta: req.delta,
    };

    let record = state.stock_adjuster.adjust(cmd.book_id, cmd.delta).await?;
    Ok(Json(StockResponse::new(record.book_id, record.stock)))
}
