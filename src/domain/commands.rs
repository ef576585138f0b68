use serde::{Deserialize, Serialize};

use super::{BookId, LoanId};

/// コマンド：書籍を貸し出す
///
/// 識別子はワイヤ上の文字列のまま受け取り、サーガの最初のステップで検証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLending {
    pub book_id: String,
    pub user_id: String,
}

/// コマンド：貸出を終了する（返却）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishLending {
    pub loan_id: LoanId,
}

/// コマンド：貸出を更新する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewLending {
    pub loan_id: LoanId,
}

/// コマンド：在庫を調整する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub book_id: BookId,
    pub delta: i32,
}
