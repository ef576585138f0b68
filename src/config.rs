//! 環境変数から読み込むアプリケーション設定

use crate::application::stock::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy};
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/library";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BOOK_SERVICE_TIMEOUT: Duration = Duration::from_millis(5000);

/// サーバー設定
///
/// 読み込む環境変数:
/// - `HOST` バインドアドレス（既定: `"0.0.0.0"`）
/// - `PORT` 待受ポート（既定: `3000`）
/// - `DATABASE_URL` PostgreSQL接続先
/// - `DATABASE_MAX_CONNECTIONS` プールの最大接続数（既定: `5`）
/// - `BOOK_SERVICE_URL` 設定時はHTTP経由で書籍サービスを呼ぶ。未設定なら同一DBの在庫台帳を直接使う
/// - `BOOK_SERVICE_TIMEOUT_MS` 書籍サービス呼び出しのタイムアウト（既定: `5000`）
/// - `STOCK_RETRY_ATTEMPTS` 在庫更新の最大試行回数（既定: `3`）
/// - `STOCK_RETRY_DELAY_MS` 競合時の待機時間（既定: `200`）
///
/// 数値として解釈できない値は既定値にフォールバックする。
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub book_service_url: Option<String>,
    pub book_service_timeout: Duration,
    pub stock_retry_attempts: u32,
    pub stock_retry_delay: Duration,
}

impl Config {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            book_service_url: lookup("BOOK_SERVICE_URL").filter(|url| !url.trim().is_empty()),
            book_service_timeout: parsed("BOOK_SERVICE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BOOK_SERVICE_TIMEOUT),
            stock_retry_attempts: lookup("STOCK_RETRY_ATTEMPTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            stock_retry_delay: parsed("STOCK_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
        }
    }

    /// `"host:port"`形式のバインドアドレス
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.stock_retry_attempts,
            delay: self.stock_retry_delay,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            book_service_url: None,
            book_service_timeout: DEFAULT_BOOK_SERVICE_TIMEOUT,
            stock_retry_attempts: DEFAULT_MAX_ATTEMPTS,
            stock_retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
