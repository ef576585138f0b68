use crate::domain::{
    loan::{Loan, NewLoan},
    value_objects::LoanId,
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出リポジトリポート（貸出側が所有）
///
/// 1件の書き込みは1ドキュメント単位で原子的であればよく、
/// 貸出間の調整は不要。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 新しい貸出を保存し、IDを採番する
    async fn create(&self, new_loan: NewLoan) -> Result<Loan>;

    /// 貸出の現在状態を上書き保存する
    ///
    /// 保存対象が存在しない場合はエラーを返す。
    async fn update(&self, loan: &Loan) -> Result<()>;

    /// IDで貸出を取得する
    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;
}
