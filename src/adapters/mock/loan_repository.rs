use crate::domain::{
    loan::{Loan, LoanStatus, NewLoan},
    value_objects::LoanId,
};
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// LoanRepositoryのモック実装
///
/// 貸出をメモリ上に保持する。作成をすべて失敗させたり、
/// 特定のステータスへの更新だけを失敗させたりできるため、
/// サーガの補償経路をテストで再現できる。
#[derive(Default)]
pub struct LoanRepository {
    loans: Mutex<HashMap<LoanId, Loan>>,
    fail_create: Mutex<bool>,
    fail_update_to: Mutex<HashSet<LoanStatus>>,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create`をすべて失敗させる
    pub fn fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    /// 書き込む貸出が`status`のときだけ`update`を失敗させる
    pub fn fail_update_to(&self, status: LoanStatus) {
        self.fail_update_to.lock().unwrap().insert(status);
    }

    /// 保存済みの全貸出（順序不定）
    pub fn all(&self) -> Vec<Loan> {
        self.loans.lock().unwrap().values().cloned().collect()
    }

    /// サーガを通さずに貸出をそのまま保存する
    pub fn insert(&self, loan: Loan) {
        self.loans.lock().unwrap().insert(loan.id, loan);
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn create(&self, new_loan: NewLoan) -> Result<Loan> {
        if *self.fail_create.lock().unwrap() {
            return Err("loan store unavailable".into());
        }

        let loan = new_loan.into_loan(LoanId::new());
        self.loans.lock().unwrap().insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn update(&self, loan: &Loan) -> Result<()> {
        if self.fail_update_to.lock().unwrap().contains(&loan.status) {
            return Err(format!("loan store rejected update to {}", loan.status).into());
        }

        let mut loans = self.loans.lock().unwrap();
        match loans.get_mut(&loan.id) {
            Some(stored) => {
                *stored = loan.clone();
                Ok(())
            }
            None => Err(format!("loan not found: {}", loan.id).into()),
        }
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.loans.lock().unwrap().get(&loan_id).cloned())
    }
}
