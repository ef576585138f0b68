use crate::domain::{
    loan::{Loan, LoanStatus, Meta, NewLoan},
    value_objects::{BookId, LoanId, UserId},
};
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

/// PostgreSQLの行データをLoanに変換する
///
/// statusの文字列からの変換でエラーハンドリングを行う。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Loan {
        id: LoanId::from_uuid(row.get("id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        status,
        return_date: row.get("return_date"),
        meta: Meta {
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        },
    })
}

/// LoanRepositoryのPostgreSQL実装
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    /// 新しい貸出を保存する
    ///
    /// IDはここで採番する。
    async fn create(&self, new_loan: NewLoan) -> Result<Loan> {
        let loan = new_loan.into_loan(LoanId::new());

        sqlx::query(
            r#"
            INSERT INTO loans (
                id,
                book_id,
                user_id,
                status,
                return_date,
                created_at,
                updated_at,
                deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(loan.id.value())
        .bind(loan.book_id.value())
        .bind(loan.user_id.value())
        .bind(loan.status.as_str())
        .bind(loan.return_date)
        .bind(loan.meta.created_at)
        .bind(loan.meta.updated_at)
        .bind(loan.meta.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(loan)
    }

    /// 貸出の可変部分（ステータス・返却期限・更新日時）を保存する
    async fn update(&self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = $2,
                return_date = $3,
                updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(loan.id.value())
        .bind(loan.status.as_str())
        .bind(loan.return_date)
        .bind(loan.meta.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("loan not found: {}", loan.id).into());
        }

        Ok(())
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                book_id,
                user_id,
                status,
                return_date,
                created_at,
                updated_at,
                deleted_at
            FROM loans
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }
}
