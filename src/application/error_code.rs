use serde::{Deserialize, Serialize};
use std::fmt;

/// 呼び出し側に公開するエラー分類
///
/// アプリケーション層の各エラーはいずれかに対応付けられ、
/// API層でHTTPステータスへ変換される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 不正な入力。副作用の前に拒否し、再試行しない
    InvalidArgument,
    /// 在庫切れ。正当な業務上の結果
    ResourceExhausted,
    /// 在庫更新の競合が再試行上限まで解消しなかった
    Conflict,
    /// 参照先が存在しない
    NotFound,
    /// 現在の状態では実行できない操作
    FailedPrecondition,
    /// 永続化・通信の障害
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID_ARGUMENT" => Ok(ErrorCode::InvalidArgument),
            "RESOURCE_EXHAUSTED" => Ok(ErrorCode::ResourceExhausted),
            "CONFLICT" => Ok(ErrorCode::Conflict),
            "NOT_FOUND" => Ok(ErrorCode::NotFound),
            "FAILED_PRECONDITION" => Ok(ErrorCode::FailedPrecondition),
            "INTERNAL" => Ok(ErrorCode::Internal),
            _ => Err(format!("Invalid error code: {}", s)),
        }
    }
}
