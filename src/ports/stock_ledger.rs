use crate::domain::{stock::StockRecord, value_objects::BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 在庫台帳ポート（カタログ側が所有）
///
/// 書籍ごとの非負の在庫数と、そのバージョンを保持する。
/// 在庫数の変更は`compare_and_set`経由のみで行う。
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// 書籍の在庫レコードを取得する
    ///
    /// 論理削除された書籍は存在しないものとして`None`を返す。
    async fn find(&self, book_id: BookId) -> Result<Option<StockRecord>>;

    /// 条件付き更新
    ///
    /// 現在のバージョンが`expected_version`と一致する場合に限り
    /// 在庫数を`new_stock`に設定し、バージョンを1つ進める。
    /// 一致しなかった場合（他の更新が先にコミットされた）は`None`を返す。
    /// 負の在庫はアダプター側でも拒否する。
    async fn compare_and_set(
        &self,
        book_id: BookId,
        expected_version: i64,
        new_stock: i32,
    ) -> Result<Option<StockRecord>>;
}
