use thiserror::Error;

use crate::application::ErrorCode;
use crate::domain::{StockRuleError, value_objects::BookId};

/// 在庫調整のエラー
#[derive(Debug, Error)]
pub enum StockAdjustError {
    /// 書籍が存在しない
    #[error("Book not found: {0}")]
    NotFound(BookId),

    /// 変化量0など、不正な調整要求
    #[error("{0}")]
    InvalidArgument(String),

    /// 調整後の在庫が負になる（業務ルールによる拒否、再試行しない）
    #[error("{0}")]
    ResourceExhausted(String),

    /// 再試行上限まで条件付き更新が競合した
    #[error("failed to update stock of book {book_id} after {attempts} attempts")]
    Conflict { book_id: BookId, attempts: u32 },

    /// 在庫台帳の障害
    #[error("Stock ledger error")]
    Ledger(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StockAdjustError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StockAdjustError::NotFound(_) => ErrorCode::NotFound,
            StockAdjustError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            StockAdjustError::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
            StockAdjustError::Conflict { .. } => ErrorCode::Conflict,
            StockAdjustError::Ledger(_) => ErrorCode::Internal,
        }
    }
}

impl From<StockRuleError> for StockAdjustError {
    fn from(err: StockRuleError) -> Self {
        match err {
            StockRuleError::ZeroDelta | StockRuleError::Overflow { .. } => {
                StockAdjustError::InvalidArgument(err.to_string())
            }
            StockRuleError::WouldGoNegative { .. } => {
                StockAdjustError::ResourceExhausted(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StockAdjustError>;
