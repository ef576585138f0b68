use thiserror::Error;

use super::loan::LoanStatus;

/// 識別子の形式エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {raw}")]
pub struct InvalidIdentifier {
    pub kind: &'static str,
    pub raw: String,
}

/// 貸出の状態遷移エラー
///
/// 遷移は前進のみ（DRAFT→ACTIVE, DRAFT→CANCELED, ACTIVE→INACTIVE）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot transition loan from {from} to {to}")]
pub struct TransitionError {
    pub from: LoanStatus,
    pub to: LoanStatus,
}

/// 在庫数のビジネスルール違反
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockRuleError {
    /// 変化量0の調整要求
    #[error("stock change requested is 0")]
    ZeroDelta,

    /// 調整後の在庫が負になる
    #[error("stock cannot be decreased below 0 (current {current}, delta {delta})")]
    WouldGoNegative { current: i32, delta: i32 },

    /// 調整後の在庫が表現できる上限を超える
    #[error("stock change out of range (current {current}, delta {delta})")]
    Overflow { current: i32, delta: i32 },
}
