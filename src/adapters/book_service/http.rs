use crate::api::types::{AdjustStockRequest, ErrorResponse, StockResponse};
use crate::application::ErrorCode;
use crate::domain::value_objects::BookId;
use crate::ports::book_service::{BookService, BookServiceError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// BookServiceポートのHTTP実装
///
/// `GET /books/{id}/stock`と`POST /books/{id}/stock`を公開する
/// リモートの書籍サービスを呼び出す。呼び出し中のfutureを破棄すると
/// 送信中のリクエストも破棄され、呼び出し側の取り消しが通信まで届く。
#[derive(Clone)]
pub struct HttpBookService {
    client: Client,
    base_url: String,
}

impl HttpBookService {
    /// リクエストごとのタイムアウト付きでクライアントを作成
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn stock_url(&self, book_id: BookId) -> String {
        format!("{}/books/{}/stock", self.base_url, book_id)
    }

    async fn read_stock(book_id: BookId, response: Response) -> Result<i32, BookServiceError> {
        let status = response.status();
        if status.is_success() {
            let body: StockResponse = response
                .json()
                .await
                .map_err(|e| BookServiceError::Transport(Box::new(e)))?;
            return Ok(body.stock);
        }

        let body = response.json::<ErrorResponse>().await.ok();
        Err(map_error_response(book_id, status, body))
    }
}

/// 2xx以外のレスポンスをポートのエラー分類に戻す
fn map_error_response(
    book_id: BookId,
    status: StatusCode,
    body: Option<ErrorResponse>,
) -> BookServiceError {
    if status == StatusCode::NOT_FOUND {
        return BookServiceError::NotFound(book_id);
    }

    let (code, message) = match body {
        Some(body) => (body.error.parse::<ErrorCode>().ok(), body.message),
        None => (None, format!("book service returned {}", status)),
    };

    match code {
        Some(ErrorCode::InvalidArgument) => BookServiceError::InvalidArgument(message),
        Some(ErrorCode::ResourceExhausted) => BookServiceError::ResourceExhausted(message),
        Some(ErrorCode::Conflict) => BookServiceError::Conflict(message),
        _ => BookServiceError::Transport(format!("{} ({})", message, status).into()),
    }
}

#[async_trait]
impl BookService for HttpBookService {
    async fn find_stock(&self, book_id: BookId) -> Result<i32, BookServiceError> {
        let response = self
            .client
            .get(self.stock_url(book_id))
            .send()
            .await
            .map_err(|e| BookServiceError::Transport(Box::new(e)))?;

        Self::read_stock(book_id, response).await
    }

    async fn adjust_stock(&self, book_id: BookId, delta: i32) -> Result<i32, BookServiceError> {
        let response = self
            .client
            .post(self.stock_url(book_id))
            .json(&AdjustStockRequest { delta })
            .send()
            .await
            .map_err(|e| BookServiceError::Transport(Box::new(e)))?;

        Self::read_stock(book_id, response).await
    }
}
