// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{
    AddressBook, AddressBookId, CartItem, CartItemId, CategoryId, Dish, DishId, Employee,
    EmployeeId, Money, Order, OrderId, OrderStatus, Page, PageRequest, Setmeal, SetmealId,
    ShopStatus,
    ShoppingCart, Status, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 一意制約違反
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),
    /// 読み込み後に他の処理が先に更新した
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 菜品・セットメニューの検索条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuQuery {
    /// 名前の部分一致
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<Status>,
}

/// 注文の検索条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// 注文番号の部分一致
    pub number: Option<String>,
    pub user_id: Option<UserId>,
}

/// 商品ごとの販売数量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRank {
    pub name: String,
    pub number: u64,
}

/// 従業員リポジトリトレイト
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// 従業員を保存する（存在すれば更新）
    /// ユーザー名が重複する場合は `RepositoryError::DuplicateEntry`
    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, RepositoryError>;

    /// 氏名の部分一致でページング検索する
    /// 作成日時の降順で並べて返す
    async fn find_page(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Employee>, RepositoryError>;

    fn next_identity(&self) -> EmployeeId {
        EmployeeId::new()
    }
}

/// 菜品リポジトリトレイト
/// 菜品と味付けオプションを一つのトランザクションで永続化する
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// 菜品を保存する
    /// 味付けオプションは全削除してから再登録する
    async fn save(&self, dish: &Dish) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: DishId) -> Result<Option<Dish>, RepositoryError>;

    /// 複数IDで菜品を取得する（存在しないIDは無視）
    async fn find_by_ids(&self, ids: &[DishId]) -> Result<Vec<Dish>, RepositoryError>;

    /// 条件でページング検索する
    /// 作成日時の降順で並べて返す
    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Dish>, RepositoryError>;

    /// 条件に合う菜品をすべて取得する
    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Dish>, RepositoryError>;

    /// 菜品と味付けオプションをまとめて削除する
    /// 販売中、またはセットメニューに含まれる菜品が一つでもあれば何も削除せず `Ok(false)`
    async fn delete_by_ids(&self, ids: &[DishId]) -> Result<bool, RepositoryError>;

    /// 菜品を販売停止として保存し、同じトランザクションで
    /// その菜品を含む販売中のセットメニューも停止する
    /// 停止したセットメニューのIDを返す
    async fn stop_sale(
        &self,
        dish: &Dish,
        actor: Option<EmployeeId>,
    ) -> Result<Vec<SetmealId>, RepositoryError>;

    fn next_identity(&self) -> DishId {
        DishId::new()
    }
}

/// セットメニューリポジトリトレイト
/// セットメニューと菜品の関連を一つのトランザクションで永続化する
#[async_trait]
pub trait SetmealRepository: Send + Sync {
    /// セットメニューを保存する
    /// 菜品の関連は全削除してから再登録する
    async fn save(&self, setmeal: &Setmeal) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: SetmealId) -> Result<Option<Setmeal>, RepositoryError>;

    async fn find_by_ids(&self, ids: &[SetmealId]) -> Result<Vec<Setmeal>, RepositoryError>;

    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Setmeal>, RepositoryError>;

    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Setmeal>, RepositoryError>;

    /// 指定された菜品のいずれかを含むセットメニューのIDを取得する
    async fn find_ids_by_dish_ids(
        &self,
        dish_ids: &[DishId],
    ) -> Result<Vec<SetmealId>, RepositoryError>;

    /// セットメニューと菜品の関連をまとめて削除する
    /// 販売中のセットメニューが一つでもあれば何も削除せず `Ok(false)`
    async fn delete_by_ids(&self, ids: &[SetmealId]) -> Result<bool, RepositoryError>;

    fn next_identity(&self) -> SetmealId {
        SetmealId::new()
    }
}

/// 顧客リポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_by_openid(&self, openid: &str) -> Result<Option<User>, RepositoryError>;

    fn next_identity(&self) -> UserId {
        UserId::new()
    }
}

/// 配送先住所リポジトリトレイト
#[async_trait]
pub trait AddressBookRepository: Send + Sync {
    async fn save(&self, address: &AddressBook) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: AddressBookId) -> Result<Option<AddressBook>, RepositoryError>;

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<AddressBook>, RepositoryError>;

    /// 指定した住所をデフォルトにし、同じ顧客の他の住所のデフォルトを外す
    async fn mark_default(
        &self,
        user_id: UserId,
        id: AddressBookId,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, id: AddressBookId) -> Result<(), RepositoryError>;

    fn next_identity(&self) -> AddressBookId {
        AddressBookId::new()
    }
}

/// ショッピングカートリポジトリトレイト
#[async_trait]
pub trait ShoppingCartRepository: Send + Sync {
    /// 顧客のカートを取得する（追加日時の昇順）
    async fn find_by_user(&self, user_id: UserId) -> Result<ShoppingCart, RepositoryError>;

    /// カート明細を保存する（存在すれば数量を更新）
    async fn save(&self, item: &CartItem) -> Result<(), RepositoryError>;

    async fn delete(&self, id: CartItemId) -> Result<(), RepositoryError>;

    /// 顧客のカートを空にする
    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError>;

    fn next_identity(&self) -> CartItemId {
        CartItemId::new()
    }
}

/// 注文リポジトリトレイト
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 新しい注文を登録し、同じトランザクションで注文者のカートを空にする
    async fn place(&self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文の状態を保存する
    /// 保存済みのステータスが `Order::loaded_status` と異なる場合は
    /// 何も更新せず `RepositoryError::Conflict` を返す
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 注文番号で注文を検索する（支払い通知用）
    async fn find_by_number(&self, number: &str) -> Result<Option<Order>, RepositoryError>;

    /// 条件でページング検索する
    /// 注文日時の降順で並べて返す
    async fn find_page(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    /// 指定ステータスで注文日時が指定時刻より前の注文を取得する
    async fn find_by_status_before(
        &self,
        status: OrderStatus,
        order_time: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// 注文日時が `begin` 以上 `end` 未満の注文件数
    /// ステータスを指定した場合はそのステータスの注文のみ数える
    async fn count_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError>;

    /// 注文日時が `begin` 以上 `end` 未満で指定ステータスの注文金額の合計
    async fn sum_amount_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: OrderStatus,
    ) -> Result<Money, RepositoryError>;

    /// 期間内の完了注文の明細を商品名ごとに集計し、販売数量の多い順に返す
    async fn top_sales(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SalesRank>, RepositoryError>;

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

/// 営業状態ストアエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShopStatusError {
    #[error("Shop status store unavailable: {0}")]
    Unavailable(String),
}

/// 営業状態ストアトレイト
#[async_trait]
pub trait ShopStatusStore: Send + Sync {
    async fn get(&self) -> Result<ShopStatus, ShopStatusError>;

    async fn set(&self, status: ShopStatus) -> Result<(), ShopStatusError>;
}

/// パスワードハッシュ化トレイト
pub trait PasswordHasher: Send + Sync {
    /// 平文パスワードからハッシュ値を計算する
    fn hash(&self, raw: &str) -> String;
}

/// イベントバスエラー
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベントバストレイト
/// イベントの発行と配信を管理するポート
#[async_trait]
pub trait EventBus: Send + Sync {
    /// イベントを発行し、登録されたハンドラーに配信
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}

/// 店舗向け通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum NotificationKind {
    /// 新規注文
    NewOrder,
    /// 顧客からの催促
    Reminder,
}

impl From<NotificationKind> for i32 {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::NewOrder => 1,
            NotificationKind::Reminder => 2,
        }
    }
}

impl TryFrom<i32> for NotificationKind {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(NotificationKind::NewOrder),
            2 => Ok(NotificationKind::Reminder),
            _ => Err(format!("unknown notification type: {}", code)),
        }
    }
}

/// 店舗向け通知メッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    pub content: String,
}

/// 通知送信エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotifierError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// 店舗通知トレイト
/// 管理コンソールへのプッシュ通知を抽象化する
pub trait ShopNotifier: Send + Sync {
    fn notify(&self, notification: ShopNotification) -> Result<(), NotifierError>;
}
