use crate::application::{ErrorCode, lending::LendingError, stock::StockAdjustError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Lending(LendingError),
    Stock(StockAdjustError),
    /// パスパラメータの解析失敗など、アプリケーション層に届く前のエラー
    Request(ErrorCode, String),
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError::Lending(err)
    }
}

impl From<StockAdjustError> for ApiError {
    fn from(err: StockAdjustError) -> Self {
        ApiError::Stock(err)
    }
}

/// エラーコードをHTTPステータスに対応付ける
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        // 400 Bad Request - 識別子の形式不正、変化量0
        ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        // 404 Not Found - リクエストされたリソースが存在しない
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        // 409 Conflict - 在庫更新の競合が再試行で解消しなかった
        ErrorCode::Conflict => StatusCode::CONFLICT,
        // 422 Unprocessable Entity - ビジネスルール違反
        ErrorCode::ResourceExhausted | ErrorCode::FailedPrecondition => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        // 500 Internal Server Error - システム障害
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// クライアントに返すエラー本文
///
/// 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す。
pub fn error_body(code: ErrorCode, message: String) -> ErrorResponse {
    if code == ErrorCode::Internal {
        tracing::error!("Internal error: {}", message);
        return ErrorResponse::new(code.as_str(), "An unexpected error occurred");
    }
    ErrorResponse::new(code.as_str(), message)
}

/// エラーの連鎖をたどり、原因までを含めた文字列にする
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Lending(err) => err.code(),
            ApiError::Stock(err) => err.code(),
            ApiError::Request(code, _) => *code,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Lending(err) => describe(err),
            ApiError::Stock(err) => describe(err),
            ApiError::Request(_, message) => message.clone(),
        }
    }
}

impl ApiError {
    pub fn body(&self) -> ErrorResponse {
        error_body(self.code(), self.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(self.code()), Json(self.body())).into_response()
    }
}
