use serde::{Deserialize, Serialize};

use super::{BookId, StockRuleError};

/// 在庫台帳の1レコード（カタログ側の所有）
///
/// `version`は在庫数とは独立した単調増加のバージョン。
/// 在庫数が+1/-1で元の値に戻っても、並行更新を取り違えないよう
/// 楽観的並行性制御のトークンにはこちらを使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub book_id: BookId,
    pub title: String,
    pub stock: i32,
    pub version: i64,
}

/// 純粋関数：在庫数に変化量を適用する
///
/// # エラー
/// - `ZeroDelta`: 変化量が0
/// - `WouldGoNegative`: 適用後の在庫が負になる
/// - `Overflow`: 適用後の在庫が`i32`に収まらない
pub fn apply_delta(current: i32, delta: i32) -> Result<i32, StockRuleError> {
    if delta == 0 {
        return Err(StockRuleError::ZeroDelta);
    }

    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        Some(_) => Err(StockRuleError::WouldGoNegative { current, delta }),
        None => Err(StockRuleError::Overflow { current, delta }),
    }
}
