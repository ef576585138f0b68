use thiserror::Error;

use crate::application::ErrorCode;
use crate::domain::{
    InvalidIdentifier, TransitionError,
    value_objects::{BookId, LoanId},
};
use crate::ports::BookServiceError;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LendingError {
    /// 識別子の形式が不正
    #[error("{0}")]
    InvalidArgument(String),

    /// 在庫切れ
    #[error("{0}")]
    ResourceExhausted(String),

    /// 在庫更新の競合が解消しなかった
    #[error("{0}")]
    Conflict(String),

    /// 貸出が見つからない
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    /// 書籍が見つからない
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// 現在の状態では許可されない遷移
    #[error(transparent)]
    InvalidState(#[from] TransitionError),

    /// 貸出リポジトリのエラー
    #[error("Loan repository error")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 書籍サービスの通信エラー
    #[error("Book service error")]
    BookService(#[source] BookServiceError),

    /// 補償（在庫の戻し）自体が失敗した
    ///
    /// サーガ唯一の回復不能な失敗。在庫は予約されたまま、
    /// 貸出はDRAFTのまま残る。
    #[error("compensation failed: stock of book {book_id} reserved for loan {loan_id} was not released")]
    CompensationFailed {
        loan_id: LoanId,
        book_id: BookId,
        #[source]
        source: BookServiceError,
    },

    /// 返却済みにしたが在庫を戻せなかった
    ///
    /// 自動では再試行も補償もしない。突合が必要。
    #[error("loan {loan_id} finished but stock of book {book_id} was not released")]
    StockReleaseFailed {
        loan_id: LoanId,
        book_id: BookId,
        #[source]
        source: BookServiceError,
    },
}

impl LendingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LendingError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            LendingError::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
            LendingError::Conflict(_) => ErrorCode::Conflict,
            LendingError::LoanNotFound(_) | LendingError::BookNotFound(_) => ErrorCode::NotFound,
            LendingError::InvalidState(_) => ErrorCode::FailedPrecondition,
            LendingError::Repository(_)
            | LendingError::BookService(_)
            | LendingError::CompensationFailed { .. }
            | LendingError::StockReleaseFailed { .. } => ErrorCode::Internal,
        }
    }
}

impl From<InvalidIdentifier> for LendingError {
    fn from(err: InvalidIdentifier) -> Self {
        LendingError::InvalidArgument(err.to_string())
    }
}

impl From<BookServiceError> for LendingError {
    fn from(err: BookServiceError) -> Self {
        match err {
            BookServiceError::NotFound(book_id) => LendingError::BookNotFound(book_id),
            BookServiceError::InvalidArgument(msg) => LendingError::InvalidArgument(msg),
            BookServiceError::ResourceExhausted(msg) => LendingError::ResourceExhausted(msg),
            BookServiceError::Conflict(msg) => LendingError::Conflict(msg),
            err @ BookServiceError::Transport(_) => LendingError::BookService(err),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
