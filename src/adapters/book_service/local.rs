use crate::application::stock::{StockAdjustError, StockAdjuster};
use crate::domain::value_objects::BookId;
use crate::ports::book_service::{BookService, BookServiceError};
use async_trait::async_trait;

/// 同一プロセス内の書籍サービス
///
/// 在庫台帳への操作は必ず`StockAdjuster`を経由する。
/// `BOOK_SERVICE_URL`が未設定の場合に使われる。
#[derive(Clone)]
pub struct LocalBookService {
    adjuster: StockAdjuster,
}

impl LocalBookService {
    pub fn new(adjuster: StockAdjuster) -> Self {
        Self { adjuster }
    }
}

impl From<StockAdjustError> for BookServiceError {
    fn from(err: StockAdjustError) -> Self {
        match err {
            StockAdjustError::NotFound(book_id) => BookServiceError::NotFound(book_id),
            StockAdjustError::InvalidArgument(msg) => BookServiceError::InvalidArgument(msg),
            StockAdjustError::ResourceExhausted(msg) => BookServiceError::ResourceExhausted(msg),
            err @ StockAdjustError::Conflict { .. } => BookServiceError::Conflict(err.to_string()),
            StockAdjustError::Ledger(source) => BookServiceError::Transport(source),
        }
    }
}

#[async_trait]
impl BookService for LocalBookService {
    async fn find_stock(&self, book_id: BookId) -> Result<i32, BookServiceError> {
        let record = self.adjuster.find_stock(book_id).await?;
        Ok(record.stock)
    }

    async fn adjust_stock(&self, book_id: BookId, delta: i32) -> Result<i32, BookServiceError> {
        let record = self.adjuster.adjust(book_id, delta).await?;
        Ok(record.stock)
    }
}
