use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::InvalidIdentifier;

/// 識別子の値オブジェクトを定義する
///
/// どの識別子もUUIDの薄いラッパーで、ワイヤ上の文字列からの
/// パースに失敗した場合は`InvalidIdentifier`を返す。
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn value(&self) -> Uuid {
                self.0
            }

            /// ワイヤ上の文字列からパースする
            ///
            /// # エラー
            /// UUIDとして不正な場合は`InvalidIdentifier`を返す
            pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| InvalidIdentifier {
                        kind: $label,
                        raw: raw.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_identifier!(
    /// 貸出ID - 貸出管理コンテキストの集約ID（初回永続化時に採番）
    LoanId,
    "loan id"
);

uuid_identifier!(
    /// 書籍ID - カタログ管理コンテキストへの参照
    BookId,
    "book id"
);

uuid_identifier!(
    /// 利用者ID - 利用者管理コンテキストへの参照
    ///
    /// 形式のみ検証し、存在確認は行わない。
    UserId,
    "user id"
);
