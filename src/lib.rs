//! 図書貸出サービス
//!
//! 書籍在庫（カタログ側）の予約と貸出記録（貸出側）の作成を
//! サーガとして調停する。ヘキサゴナルアーキテクチャで構成する。
//!
//! - `domain`: 純粋な型と状態遷移
//! - `ports`: 外部境界の抽象（在庫台帳・書籍サービス・貸出リポジトリ）
//! - `application`: 楽観的在庫調整と貸出サーガ
//! - `adapters`: PostgreSQL / インメモリ / HTTP 実装
//! - `api`: axum による HTTP インターフェース

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
