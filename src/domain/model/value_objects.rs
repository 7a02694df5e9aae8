use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから識別子を作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から識別子を作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(
    /// 従業員の一意識別子
    EmployeeId
);
define_id!(
    /// 菜品の一意識別子
    DishId
);
define_id!(
    /// セットメニューの一意識別子
    SetmealId
);
define_id!(
    /// カテゴリの一意識別子
    CategoryId
);
define_id!(
    /// 顧客の一意識別子
    UserId
);
define_id!(
    /// 配送先住所の一意識別子
    AddressBookId
);
define_id!(
    /// カート明細の一意識別子
    CartItemId
);
define_id!(
    /// 注文の一意識別子
    OrderId
);

/// 金額を表す値オブジェクト
/// 人民元の「分」（1/100元）単位の整数で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// 金額を作成
    /// 負の金額は受け付けない
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::InvalidValue(format!(
                "金額は0以上である必要があります: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// 検証済みの金額を作成（データベースからの再構築用）
    pub fn cny(amount: i64) -> Self {
        Self(amount)
    }

    /// 0元
    pub fn zero() -> Self {
        Self(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// 金額を加算
    /// 上限を超える場合は `AmountOverflow`
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// 販売・アカウントの有効状態
/// 菜品・セットメニューでは「販売中/販売停止」、従業員では「有効/ロック」を表す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Status {
    /// 無効（販売停止・ロック）
    Disabled,
    /// 有効（販売中）
    Enabled,
}

impl Status {
    /// 数値コードからStatusを作成
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Status::Disabled),
            1 => Ok(Status::Enabled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効なステータス値: {}",
                code
            ))),
        }
    }

    /// 数値コードを取得
    pub fn code(&self) -> i32 {
        match self {
            Status::Disabled => 0,
            Status::Enabled => 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Status::Enabled)
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for Status {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Status::from_code(code)
    }
}

/// 店舗の営業状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ShopStatus {
    /// 営業時間外
    #[default]
    Closed,
    /// 営業中
    Open,
}

impl ShopStatus {
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            0 => Ok(ShopStatus::Closed),
            1 => Ok(ShopStatus::Open),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な営業状態: {}",
                code
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ShopStatus::Closed => 0,
            ShopStatus::Open => 1,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ShopStatus::Open)
    }
}

impl From<ShopStatus> for i32 {
    fn from(status: ShopStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for ShopStatus {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ShopStatus::from_code(code)
    }
}

/// 監査情報を表す値オブジェクト
/// 作成・更新の日時と操作した従業員を記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
    create_user: Option<EmployeeId>,
    update_user: Option<EmployeeId>,
}

impl AuditInfo {
    /// 新規作成時の監査情報
    pub fn created_by(actor: Option<EmployeeId>) -> Self {
        let now = Utc::now();
        Self {
            create_time: now,
            update_time: now,
            create_user: actor,
            update_user: actor,
        }
    }

    /// データベースから取得した値で再構築
    pub fn reconstruct(
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
        create_user: Option<EmployeeId>,
        update_user: Option<EmployeeId>,
    ) -> Self {
        Self {
            create_time,
            update_time,
            create_user,
            update_user,
        }
    }

    /// 更新日時と更新者を記録
    pub fn touch(&mut self, actor: Option<EmployeeId>) {
        self.update_time = Utc::now();
        self.update_user = actor;
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn update_time(&self) -> DateTime<Utc> {
        self.update_time
    }

    pub fn create_user(&self) -> Option<EmployeeId> {
        self.create_user
    }

    pub fn update_user(&self) -> Option<EmployeeId> {
        self.update_user
    }
}

/// ページング条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// ページング条件を作成
    /// ページ番号は1始まり。範囲外の値は補正する
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .min(Self::MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// SQLのOFFSET値
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// ページング結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: u64, records: Vec<T>) -> Self {
        Self { total, records }
    }

    /// 要素を変換したページを作成
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            total: self.total,
            records: self.records.into_iter().map(f).collect(),
        }
    }
}

/// 文字列が上限文字数以内か検証
/// 上限はテーブルのVARCHAR幅に合わせる
pub(crate) fn ensure_max_chars(label: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{}は{}文字以内で指定してください",
            label, max
        )));
    }
    Ok(())
}
