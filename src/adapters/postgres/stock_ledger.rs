use crate::domain::{stock::StockRecord, value_objects::BookId};
use crate::ports::stock_ledger::{Result, StockLedger as StockLedgerTrait};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_stock_record(row: &PgRow) -> StockRecord {
    StockRecord {
        book_id: BookId::from_uuid(row.get("id")),
        title: row.get("title"),
        stock: row.get("stock"),
        version: row.get("version"),
    }
}

/// StockLedgerのPostgreSQL実装
///
/// `books`テーブルの`stock`列を在庫数、`version`列を楽観的並行性制御の
/// トークンとして使う。論理削除済みの書籍は対象外。
pub struct StockLedger {
    pool: PgPool,
}

impl StockLedger {
    /// PostgreSQLコネクションプールから新しいStockLedgerを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 書籍を登録する
    ///
    /// 書籍カタログの管理は範囲外。初期データ投入とテストに使う。
    pub async fn insert_book(&self, title: &str, stock: i32) -> Result<StockRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (id, title, stock, version)
            VALUES ($1, $2, $3, 0)
            RETURNING id, title, stock, version
            "#,
        )
        .bind(BookId::new().value())
        .bind(title)
        .bind(stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_stock_record(&row))
    }
}

#[async_trait]
impl StockLedgerTrait for StockLedger {
    async fn find(&self, book_id: BookId) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, stock, version
            FROM books
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_stock_record))
    }

    /// バージョン一致を条件に在庫数を更新する
    ///
    /// 0行更新は競合（他の更新が先にコミットされた）として`None`を返す。
    /// `stock >= 0`のCHECK制約が負の在庫を最終的に防ぐ。
    async fn compare_and_set(
        &self,
        book_id: BookId,
        expected_version: i64,
        new_stock: i32,
    ) -> Result<Option<StockRecord>> {
        if new_stock < 0 {
            return Err(format!("stock cannot be negative: {}", new_stock).into());
        }

        let row = sqlx::query(
            r#"
            UPDATE books
            SET stock = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING id, title, stock, version
            "#,
        )
        .bind(book_id.value())
        .bind(expected_version)
        .bind(new_stock)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_stock_record))
    }
}
