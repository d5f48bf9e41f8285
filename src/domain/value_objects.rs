use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 貸出ID - 貸出台帳の1レコードを識別する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 書籍ID - 在庫台帳の1行を識別する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 借り手ID - 認証層から渡される利用者の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowerId(Uuid);

impl BorrowerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BorrowerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 貸出日数の範囲外エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duration {requested} days is outside {min_days}..={max_days}")]
pub struct DurationOutOfRange {
    pub requested: i32,
    pub min_days: i32,
    pub max_days: i32,
}

/// 貸出日数のポリシー
///
/// 既定値は1日から30日まで。設定で上書きできる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPolicy {
    pub min_days: i32,
    pub max_days: i32,
}

impl RentalPolicy {
    pub const DEFAULT_MIN_DAYS: i32 = 1;
    pub const DEFAULT_MAX_DAYS: i32 = 30;

    /// 指定日数をポリシーで検証し、貸出日数を作成する
    pub fn duration(&self, days: i32) -> Result<RentalDuration, DurationOutOfRange> {
        if days < self.min_days || days > self.max_days {
            return Err(DurationOutOfRange {
                requested: days,
                min_days: self.min_days,
                max_days: self.max_days,
            });
        }
        Ok(RentalDuration(days))
    }
}

impl Default for RentalPolicy {
    fn default() -> Self {
        Self {
            min_days: Self::DEFAULT_MIN_DAYS,
            max_days: Self::DEFAULT_MAX_DAYS,
        }
    }
}

/// 貸出日数
///
/// 不変条件：ポリシーの範囲内の値しか存在しない。
/// `RentalPolicy::duration` か `TryFrom<i32>`（既定ポリシー）でのみ作成できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalDuration(i32);

impl RentalDuration {
    pub fn days(&self) -> i32 {
        self.0
    }

    /// 永続化済みの値から復元する（保存時に検証済み）
    pub(crate) fn from_stored(days: i32) -> Self {
        Self(days)
    }
}

impl TryFrom<i32> for RentalDuration {
    type Error = DurationOutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        RentalPolicy::default().duration(value)
    }
}
