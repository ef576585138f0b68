use crate::domain::{
    commands::CreateLending,
    loan::{Loan, LoanStatus},
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::errors::LendingError;
use super::lending_service::{SagaOutcome, ServiceDependencies, create_lending};

/// サーガ結果ストリームのバッファ長（DRAFT・終端・エラーの最大3件）
const STREAM_BUFFER: usize = 4;

/// サーガ結果ストリームの1要素
#[derive(Debug)]
pub enum SagaFrame {
    /// 貸出のスナップショット
    Snapshot(Loan),
    /// サーガの失敗（常に最後）
    Failed(LendingError),
}

/// サーガの途中経過を呼び出し側へ配信する
///
/// 配信順序の保証：
/// - DRAFTのスナップショットは終端スナップショットより先
/// - 終端スナップショット（ACTIVE/CANCELED）は高々1件で、常に最後
///
/// 受信側がいない場合、配信は黙って捨てられる。
#[derive(Debug, Default)]
pub struct SnapshotEmitter {
    tx: Option<mpsc::Sender<SagaFrame>>,
    terminal_sent: AtomicBool,
}

impl SnapshotEmitter {
    pub fn new(tx: mpsc::Sender<SagaFrame>) -> Self {
        Self {
            tx: Some(tx),
            terminal_sent: AtomicBool::new(false),
        }
    }

    /// 配信先を持たないエミッター
    pub fn discard() -> Self {
        Self::default()
    }

    pub async fn emit(&self, loan: &Loan) {
        if self.terminal_sent.load(Ordering::SeqCst) {
            tracing::error!(loan_id = %loan.id, status = %loan.status, "snapshot after terminal dropped");
            return;
        }
        if loan.status != LoanStatus::Draft {
            self.terminal_sent.store(true, Ordering::SeqCst);
        }

        if let Some(tx) = &self.tx {
            if tx.send(SagaFrame::Snapshot(loan.clone())).await.is_err() {
                tracing::debug!(loan_id = %loan.id, "saga stream receiver dropped");
            }
        }
    }
}

/// 書籍を貸し出し、途中経過をストリームで返す
///
/// サーガは別タスクで実行される。受信側が破棄された（呼び出し側の切断）時点で
/// サーガのfutureも破棄され、実行中の外部呼び出しは取り消される。
/// 既に在庫台帳へコミットされた予約は取り消しによって補償されない。
pub fn create_lending_stream(
    deps: ServiceDependencies,
    cmd: CreateLending,
) -> ReceiverStream<SagaFrame> {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);

    tokio::spawn(async move {
        let emitter = SnapshotEmitter::new(tx.clone());

        tokio::select! {
            () = tx.closed() => {
                tracing::warn!("caller went away, lending saga aborted");
            }
            outcome = create_lending(&deps, cmd, &emitter) => {
                if let Err(err) = outcome.and_then(SagaOutcome::into_result) {
                    let _ = tx.send(SagaFrame::Failed(err)).await;
                }
            }
        }
    });

    ReceiverStream::new(rx)
}
