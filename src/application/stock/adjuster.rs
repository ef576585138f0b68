use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    stock::{StockRecord, apply_delta},
    value_objects::BookId,
};
use crate::ports::StockLedger;

use super::errors::{Result, StockAdjustError};

/// 条件付き更新の最大試行回数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 競合時の試行間隔
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// 競合時の再試行ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最初の試行を含む試行回数（0は1として扱う）
    pub max_attempts: u32,
    /// 試行間の待機時間（固定）
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// 楽観的在庫調整
///
/// 在庫台帳の条件付き更新を、有限回の再試行で包む。
/// 台帳全体をロックせず、競合は明示的な`Conflict`エラーとして表面化させる。
#[derive(Clone)]
pub struct StockAdjuster {
    ledger: Arc<dyn StockLedger>,
    policy: RetryPolicy,
}

impl StockAdjuster {
    pub fn new(ledger: Arc<dyn StockLedger>, policy: RetryPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 現在の在庫レコードを取得する（FindStockByItem）
    pub async fn find_stock(&self, book_id: BookId) -> Result<StockRecord> {
        self.ledger
            .find(book_id)
            .await
            .map_err(StockAdjustError::Ledger)?
            .ok_or(StockAdjustError::NotFound(book_id))
    }

    /// 在庫を調整する（AdjustStock）
    ///
    /// 1. 現在の在庫とバージョンを読む
    /// 2. 調整後の在庫が負になる場合は再試行せず`ResourceExhausted`
    /// 3. 「バージョンが読んだ値のままなら」在庫を更新する
    /// 4. 条件不一致（競合）なら一定時間待って1からやり直す
    ///
    /// 試行回数を使い切った場合は`Conflict`を返す。呼び出し側はこれを
    /// 予約失敗として扱い、さらに再試行してはならない。
    ///
    /// # エラー
    /// - `InvalidArgument`: 変化量が0
    /// - `NotFound`: 書籍が存在しない
    /// - `ResourceExhausted`: 在庫が負になる
    /// - `Conflict`: 再試行上限に到達
    /// - `Ledger`: 台帳の障害
    #[tracing::instrument(skip(self), fields(book_id = %book_id))]
    pub async fn adjust(&self, book_id: BookId, delta: i32) -> Result<StockRecord> {
        if delta == 0 {
            return Err(crate::domain::StockRuleError::ZeroDelta.into());
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = self.find_stock(book_id).await?;
            let next_stock = apply_delta(current.stock, delta)?;

            let updated = self
                .ledger
                .compare_and_set(book_id, current.version, next_stock)
                .await
                .map_err(StockAdjustError::Ledger)?;

            if let Some(record) = updated {
                tracing::debug!(attempt, stock = record.stock, "stock adjusted");
                return Ok(record);
            }

            if attempt >= max_attempts {
                tracing::warn!(attempt, "stock update conflict, giving up");
                return Err(StockAdjustError::Conflict {
                    book_id,
                    attempts: attempt,
                });
            }

            tracing::debug!(attempt, "stock update conflict, retrying");
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
