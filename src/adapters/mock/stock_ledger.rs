use crate::domain::{stock::StockRecord, value_objects::BookId};
use crate::ports::stock_ledger::{Result, StockLedger as StockLedgerTrait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// StockLedgerのインメモリ実装
///
/// テスト用に競合や書き込み失敗を注入できる。
/// `find`は一度スケジューラに制御を返すため、並行する調整が
/// 同じバージョンを読んでから競合する状況を再現できる。
#[derive(Default)]
pub struct StockLedger {
    records: Mutex<HashMap<BookId, StockRecord>>,
    forced_conflicts: AtomicU32,
    fail_writes: AtomicBool,
    cas_calls: AtomicU32,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書籍を登録し、そのIDを返す
    pub fn add_book(&self, title: &str, stock: i32) -> BookId {
        let book_id = BookId::new();
        self.records.lock().unwrap().insert(
            book_id,
            StockRecord {
                book_id,
                title: title.to_string(),
                stock,
                version: 0,
            },
        );
        book_id
    }

    /// 現在の在庫数
    pub fn stock_of(&self, book_id: BookId) -> Option<i32> {
        self.records.lock().unwrap().get(&book_id).map(|r| r.stock)
    }

    /// 次のn回の条件付き更新を競合として失敗させる
    pub fn force_conflicts(&self, n: u32) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    /// 条件付き更新を台帳障害として失敗させる
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// これまでの条件付き更新の呼び出し回数
    pub fn cas_calls(&self) -> u32 {
        self.cas_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockLedgerTrait for StockLedger {
    async fn find(&self, book_id: BookId) -> Result<Option<StockRecord>> {
        let record = self.records.lock().unwrap().get(&book_id).cloned();
        tokio::task::yield_now().await;
        Ok(record)
    }

    async fn compare_and_set(
        &self,
        book_id: BookId,
        expected_version: i64,
        new_stock: i32,
    ) -> Result<Option<StockRecord>> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("stock ledger unavailable".into());
        }

        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if forced.is_ok() {
            return Ok(None);
        }

        if new_stock < 0 {
            return Err(format!("stock cannot be negative: {}", new_stock).into());
        }

        let mut records = self.records.lock().unwrap();
        match records.get_mut(&book_id) {
            Some(record) if record.version == expected_version => {
                record.stock = new_stock;
                record.version += 1;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}
