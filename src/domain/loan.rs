use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BookId, LoanId, TransitionError, UserId};

/// 貸出期間（日数）
///
/// 作成時も更新（renew）時も「現在時刻 + 14日」を返却期限とする。
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// 貸出ステータス
///
/// ```text
/// DRAFT ──┬──► ACTIVE ──► INACTIVE
///         └──► CANCELED
/// ```
/// CANCELED と INACTIVE は終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// 在庫予約待ち
    Draft,
    /// 貸出中
    Active,
    /// 予約失敗により取消
    Canceled,
    /// 返却済み
    Inactive,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Draft => "DRAFT",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Canceled => "CANCELED",
            LoanStatus::Inactive => "INACTIVE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Canceled | LoanStatus::Inactive)
    }

    /// 前進方向の遷移のみ許可する
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Draft, LoanStatus::Active)
                | (LoanStatus::Draft, LoanStatus::Canceled)
                | (LoanStatus::Active, LoanStatus::Inactive)
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(LoanStatus::Draft),
            "ACTIVE" => Ok(LoanStatus::Active),
            "CANCELED" => Ok(LoanStatus::Canceled),
            "INACTIVE" => Ok(LoanStatus::Inactive),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// 監査情報
///
/// `deleted_at`は論理削除マーカー。貸出は物理削除も論理削除もされないため常にNone。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Meta {
    pub fn created(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            ..self.clone()
        }
    }
}

/// 永続化前の貸出
///
/// IDは初回永続化時にリポジトリが採番するため、まだ持たない。
/// 状態は常にDRAFT。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub user_id: UserId,
    pub return_date: DateTime<Utc>,
    pub meta: Meta,
}

impl NewLoan {
    /// 採番されたIDを付与してDRAFTの貸出集約にする
    pub fn into_loan(self, id: LoanId) -> Loan {
        Loan {
            id,
            book_id: self.book_id,
            user_id: self.user_id,
            status: LoanStatus::Draft,
            return_date: self.return_date,
            meta: self.meta,
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 生成も変更も貸出サーガのみが行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub status: LoanStatus,
    pub return_date: DateTime<Utc>,
    #[serde(flatten)]
    pub meta: Meta,
}

fn due_date_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(LOAN_PERIOD_DAYS)
}

/// 純粋関数：DRAFTの貸出を起票する
pub fn draft_loan(book_id: BookId, user_id: UserId, now: DateTime<Utc>) -> NewLoan {
    NewLoan {
        book_id,
        user_id,
        return_date: due_date_from(now),
        meta: Meta::created(now),
    }
}

fn transition(
    loan: &Loan,
    next: LoanStatus,
    now: DateTime<Utc>,
) -> Result<Loan, TransitionError> {
    if !loan.status.can_transition_to(next) {
        return Err(TransitionError {
            from: loan.status,
            to: next,
        });
    }

    Ok(Loan {
        status: next,
        meta: loan.meta.touched(now),
        ..loan.clone()
    })
}

/// 純粋関数：在庫予約成功（DRAFT → ACTIVE）
pub fn activate(loan: &Loan, now: DateTime<Utc>) -> Result<Loan, TransitionError> {
    transition(loan, LoanStatus::Active, now)
}

/// 純粋関数：在庫予約失敗（DRAFT → CANCELED）
pub fn cancel(loan: &Loan, now: DateTime<Utc>) -> Result<Loan, TransitionError> {
    transition(loan, LoanStatus::Canceled, now)
}

/// 純粋関数：返却（ACTIVE → INACTIVE）
pub fn finish(loan: &Loan, now: DateTime<Utc>) -> Result<Loan, TransitionError> {
    transition(loan, LoanStatus::Inactive, now)
}

/// 純粋関数：貸出を更新する
///
/// 返却期限を「現在時刻 + 14日」に再設定する（従来の期限からの延長ではない）。
/// ステータス・書籍・利用者は変更しない。
pub fn renew(loan: &Loan, now: DateTime<Utc>) -> Loan {
    Loan {
        return_date: due_date_from(now),
        meta: loan.meta.touched(now),
        ..loan.clone()
    }
}
