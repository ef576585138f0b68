use crate::domain::value_objects::BookId;
use async_trait::async_trait;
use thiserror::Error;

/// 書籍サービス呼び出しのエラー
///
/// 貸出側から見たリモート在庫操作の失敗分類。
#[derive(Debug, Error)]
pub enum BookServiceError {
    /// 書籍が存在しない
    #[error("book not found: {0}")]
    NotFound(BookId),

    /// 不正な要求（変化量0など）
    #[error("invalid stock request: {0}")]
    InvalidArgument(String),

    /// 在庫不足（負の在庫になる調整）
    #[error("stock exhausted: {0}")]
    ResourceExhausted(String),

    /// 再試行上限まで競合が解消しなかった
    #[error("stock update conflict: {0}")]
    Conflict(String),

    /// 通信・永続化の障害
    #[error("book service unavailable")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 書籍サービスポート
///
/// 貸出コンテキストとカタログコンテキストの境界を維持する。
/// 貸出コンテキストは在庫台帳に直接触れず、必ずこのポートを経由する。
#[async_trait]
pub trait BookService: Send + Sync {
    /// 現在の在庫数を取得する（FindStockByItem）
    async fn find_stock(&self, book_id: BookId) -> Result<i32, BookServiceError>;

    /// 在庫を調整し、調整後の在庫数を返す（AdjustStock）
    ///
    /// 同じ変化量での再呼び出しは独立した新しい調整になる。
    /// 二重適用しないのは呼び出し側の責任。
    async fn adjust_stock(&self, book_id: BookId, delta: i32) -> Result<i32, BookServiceError>;
}
