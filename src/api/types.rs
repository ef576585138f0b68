use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    commands::CreateLending,
    loan::{Loan, LoanStatus},
    value_objects::BookId,
};

/// 貸出作成リクエスト（POST /loans）
///
/// 識別子は文字列のまま受け取り、形式検証はアプリケーション層で行う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLendingRequest {
    pub book_id: String,
    pub user_id: String,
}

impl CreateLendingRequest {
    pub fn to_command(&self) -> CreateLending {
        CreateLending {
            book_id: self.book_id.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

/// 貸出レスポンス
///
/// GET /loans/:id などの本文と、POST /loans のストリームの各`loan`イベントに使う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub status: LoanStatus,
    pub return_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id.value(),
            book_id: loan.book_id.value(),
            user_id: loan.user_id.value(),
            status: loan.status,
            return_date: loan.return_date,
            created_at: loan.meta.created_at,
            updated_at: loan.meta.updated_at,
        }
    }
}

/// 在庫レスポンス（GET/POST /books/:id/stock）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    pub book_id: Uuid,
    pub stock: i32,
}

impl StockResponse {
    pub fn new(book_id: BookId, stock: i32) -> Self {
        Self {
            book_id: book_id.value(),
            stock,
        }
    }
}

/// 在庫調整リクエスト（POST /books/:id/stock）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i32,
}

/// エラーレスポンス
///
/// `error`はエラーコード（`RESOURCE_EXHAUSTED`など）、`message`は人間向けの説明。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
