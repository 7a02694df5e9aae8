use crate::domain::error::DomainError;
use crate::domain::event::{DomainEvent, OrderPaid, OrderReminded};
use crate::domain::model::{
    AddressBook, AddressBookId, CartItem, DishId, Money, OrderId, SetmealId, ShoppingCart, UserId,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 注文のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum OrderStatus {
    /// 支払い待ち
    PendingPayment,
    /// 店舗の受付待ち
    ToBeConfirmed,
    /// 受付済み
    Confirmed,
    /// 配達中
    DeliveryInProgress,
    /// 完了
    Completed,
    /// キャンセル済み
    Cancelled,
}

impl OrderStatus {
    /// 数値コードからOrderStatusを作成
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            1 => Ok(OrderStatus::PendingPayment),
            2 => Ok(OrderStatus::ToBeConfirmed),
            3 => Ok(OrderStatus::Confirmed),
            4 => Ok(OrderStatus::DeliveryInProgress),
            5 => Ok(OrderStatus::Completed),
            6 => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な注文ステータス: {}",
                code
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            OrderStatus::PendingPayment => 1,
            OrderStatus::ToBeConfirmed => 2,
            OrderStatus::Confirmed => 3,
            OrderStatus::DeliveryInProgress => 4,
            OrderStatus::Completed => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    /// これ以上遷移しない状態か
    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::PendingPayment => "PendingPayment",
            OrderStatus::ToBeConfirmed => "ToBeConfirmed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::DeliveryInProgress => "DeliveryInProgress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        };
        write!(f, "{}", status_str)
    }
}

impl From<OrderStatus> for i32 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for OrderStatus {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        OrderStatus::from_code(code)
    }
}

/// 支払いステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PayStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PayStatus {
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            0 => Ok(PayStatus::Unpaid),
            1 => Ok(PayStatus::Paid),
            2 => Ok(PayStatus::Refunded),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な支払いステータス: {}",
                code
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PayStatus::Unpaid => 0,
            PayStatus::Paid => 1,
            PayStatus::Refunded => 2,
        }
    }
}

impl From<PayStatus> for i32 {
    fn from(status: PayStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for PayStatus {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        PayStatus::from_code(code)
    }
}

/// 支払い方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PayMethod {
    WeChat,
    Alipay,
}

impl PayMethod {
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            1 => Ok(PayMethod::WeChat),
            2 => Ok(PayMethod::Alipay),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な支払い方法: {}",
                code
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PayMethod::WeChat => 1,
            PayMethod::Alipay => 2,
        }
    }
}

impl From<PayMethod> for i32 {
    fn from(method: PayMethod) -> Self {
        method.code()
    }
}

impl TryFrom<i32> for PayMethod {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        PayMethod::from_code(code)
    }
}

/// 注文明細
/// カート明細の内容を注文時点の値で固定したもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    name: String,
    image: String,
    dish_id: Option<DishId>,
    setmeal_id: Option<SetmealId>,
    dish_flavor: Option<String>,
    number: u32,
    amount: Money,
}

impl OrderDetail {
    /// 注文明細を作成
    /// 数量は1以上、菜品IDとセットメニューIDはちょうど一方が必要
    pub fn new(
        name: String,
        image: String,
        dish_id: Option<DishId>,
        setmeal_id: Option<SetmealId>,
        dish_flavor: Option<String>,
        number: u32,
        amount: Money,
    ) -> Result<Self, DomainError> {
        if number == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if dish_id.is_some() == setmeal_id.is_some() {
            return Err(DomainError::Validation(
                "注文明細には菜品かセットメニューのどちらか一方が必要です".to_string(),
            ));
        }
        Ok(Self {
            name,
            image,
            dish_id,
            setmeal_id,
            dish_flavor,
            number,
            amount,
        })
    }

    /// カート明細から注文明細を作成
    pub fn from_cart_item(item: &CartItem) -> Self {
        let product = item.product();
        Self {
            name: item.name().to_string(),
            image: item.image().to_string(),
            dish_id: product.dish_id(),
            setmeal_id: product.setmeal_id(),
            dish_flavor: product.flavor().map(str::to_string),
            number: item.number(),
            amount: item.amount(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn dish_id(&self) -> Option<DishId> {
        self.dish_id
    }

    pub fn setmeal_id(&self) -> Option<SetmealId> {
        self.setmeal_id
    }

    pub fn dish_flavor(&self) -> Option<&str> {
        self.dish_flavor.as_deref()
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// 単価
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// 小計を計算（単価 × 数量）
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.amount.multiply(self.number)
    }
}

/// 注文時に顧客が指定する項目
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub address_book_id: AddressBookId,
    pub pay_method: PayMethod,
    pub remark: String,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub pack_amount: Money,
    pub tableware_number: u32,
}

/// データベースの注文行
/// 集約の再構築に使う
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub number: String,
    pub status: OrderStatus,
    pub user_id: UserId,
    pub address_book_id: AddressBookId,
    pub consignee: String,
    pub phone: String,
    pub address: String,
    pub order_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub pay_method: PayMethod,
    pub pay_status: PayStatus,
    pub amount: Money,
    pub remark: String,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub pack_amount: Money,
    pub tableware_number: u32,
}

/// Order集約
/// 注文のライフサイクルを管理し、ビジネスルールを適用する
#[derive(Debug, Clone)]
pub struct Order {
    record: OrderRecord,
    details: Vec<OrderDetail>,
    /// 読み込んだ時点のステータス。保存時にこの値と一致する行だけを更新する
    loaded_status: OrderStatus,
    domain_events: Vec<DomainEvent>,
}

impl Order {
    /// 支払い待ちのまま放置できる時間の既定値
    pub const PAYMENT_TIMEOUT_MINUTES: i64 = 15;
    /// 配達中から自動完了とみなすまでの時間の既定値
    pub const DELIVERY_TIMEOUT_MINUTES: i64 = 60;
    /// 備考の最大文字数
    pub const MAX_REMARK_LEN: usize = 100;
    /// キャンセル・拒否理由の最大文字数
    pub const MAX_REASON_LEN: usize = 255;

    /// カートの内容から注文を作成
    /// 事前条件:
    /// - カートが空でない
    /// - 配送先住所が注文者本人のもの
    pub fn place(
        id: OrderId,
        number: String,
        user_id: UserId,
        address: &AddressBook,
        cart: &ShoppingCart,
        request: OrderRequest,
    ) -> Result<Self, DomainError> {
        if cart.is_empty() {
            return Err(DomainError::ShoppingCartEmpty);
        }
        if address.user_id() != user_id || address.id() != request.address_book_id {
            return Err(DomainError::AddressBookMissing);
        }
        if request.remark.chars().count() > Self::MAX_REMARK_LEN {
            return Err(DomainError::Validation(format!(
                "備考は{}文字以内で入力してください",
                Self::MAX_REMARK_LEN
            )));
        }

        let details: Vec<OrderDetail> = cart.items().iter().map(OrderDetail::from_cart_item).collect();
        let amount = cart.total()?.add(&request.pack_amount)?;

        let record = OrderRecord {
            id,
            number,
            status: OrderStatus::PendingPayment,
            user_id,
            address_book_id: address.id(),
            consignee: address.consignee().to_string(),
            phone: address.phone().to_string(),
            address: address.full_address(),
            order_time: Utc::now(),
            checkout_time: None,
            pay_method: request.pay_method,
            pay_status: PayStatus::Unpaid,
            amount,
            remark: request.remark,
            cancel_reason: None,
            rejection_reason: None,
            cancel_time: None,
            estimated_delivery_time: request.estimated_delivery_time,
            delivery_time: None,
            pack_amount: request.pack_amount,
            tableware_number: request.tableware_number,
        };

        Ok(Self {
            record,
            details,
            loaded_status: OrderStatus::PendingPayment,
            domain_events: Vec::new(),
        })
    }

    /// データベースから取得したデータで注文を再構築
    pub fn reconstruct(record: OrderRecord, details: Vec<OrderDetail>) -> Self {
        let loaded_status = record.status;
        Self {
            record,
            details,
            loaded_status,
            domain_events: Vec::new(),
        }
    }

    /// 注文番号を採番
    /// 日時（ミリ秒まで）と乱数4桁を連結する
    pub fn generate_number() -> String {
        let suffix = uuid::Uuid::new_v4().as_u128() % 10_000;
        format!("{}{:04}", Utc::now().format("%Y%m%d%H%M%S%3f"), suffix)
    }

    pub fn id(&self) -> OrderId {
        self.record.id
    }

    pub fn number(&self) -> &str {
        &self.record.number
    }

    pub fn status(&self) -> OrderStatus {
        self.record.status
    }

    /// 読み込んだ時点（新規なら確定時点）のステータス
    pub fn loaded_status(&self) -> OrderStatus {
        self.loaded_status
    }

    pub fn pay_status(&self) -> PayStatus {
        self.record.pay_status
    }

    pub fn user_id(&self) -> UserId {
        self.record.user_id
    }

    pub fn amount(&self) -> Money {
        self.record.amount
    }

    pub fn order_time(&self) -> DateTime<Utc> {
        self.record.order_time
    }

    pub fn record(&self) -> &OrderRecord {
        &self.record
    }

    pub fn details(&self) -> &[OrderDetail] {
        &self.details
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// 支払い完了を記録
    /// 支払い待ちの注文のみ受付待ちに進む。既に支払い済みの場合は何もしない
    ///
    /// # Returns
    /// * `Ok(true)` - 状態が変化した
    /// * `Ok(false)` - 既に支払い済み（重複通知）
    pub fn mark_paid(&mut self) -> Result<bool, DomainError> {
        if self.record.pay_status == PayStatus::Paid {
            return Ok(false);
        }
        if self.record.status != OrderStatus::PendingPayment {
            return Err(DomainError::InvalidOrderState(
                "支払いできるのは支払い待ちの注文のみです".to_string(),
            ));
        }

        self.record.status = OrderStatus::ToBeConfirmed;
        self.record.pay_status = PayStatus::Paid;
        self.record.checkout_time = Some(Utc::now());

        let event = OrderPaid::new(self.record.id, self.record.number.clone(), self.record.amount);
        self.domain_events.push(DomainEvent::OrderPaid(event));

        Ok(true)
    }

    /// 顧客からの催促
    /// 完了・キャンセル済みの注文は催促できない
    pub fn remind(&mut self) -> Result<(), DomainError> {
        if self.record.status.is_final() {
            return Err(DomainError::InvalidOrderState(
                "完了またはキャンセル済みの注文は催促できません".to_string(),
            ));
        }

        let event = OrderReminded::new(self.record.id, self.record.number.clone());
        self.domain_events.push(DomainEvent::OrderReminded(event));
        Ok(())
    }

    /// 店舗が注文を受け付ける
    /// 事前条件: ステータスがToBeConfirmed
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if self.record.status != OrderStatus::ToBeConfirmed {
            return Err(DomainError::InvalidOrderState(
                "受け付けできるのは受付待ちの注文のみです".to_string(),
            ));
        }
        self.record.status = OrderStatus::Confirmed;
        Ok(())
    }

    /// 店舗が注文を拒否する
    /// 事前条件: ステータスがToBeConfirmed。支払い済みなら返金扱いにする
    pub fn reject(&mut self, reason: String) -> Result<(), DomainError> {
        if self.record.status != OrderStatus::ToBeConfirmed {
            return Err(DomainError::InvalidOrderState(
                "拒否できるのは受付待ちの注文のみです".to_string(),
            ));
        }
        Self::ensure_reason_len(&reason)?;
        self.record.rejection_reason = Some(reason);
        self.close_as_cancelled();
        Ok(())
    }

    /// 注文をキャンセル
    /// 完了・キャンセル済みの注文はキャンセルできない。支払い済みなら返金扱いにする
    pub fn cancel(&mut self, reason: String) -> Result<(), DomainError> {
        match self.record.status {
            OrderStatus::Completed => {
                return Err(DomainError::InvalidOrderState(
                    "完了した注文はキャンセルできません".to_string(),
                ));
            }
            OrderStatus::Cancelled => {
                return Err(DomainError::InvalidOrderState(
                    "既にキャンセル済みの注文です".to_string(),
                ));
            }
            _ => {}
        }
        Self::ensure_reason_len(&reason)?;
        self.record.cancel_reason = Some(reason);
        self.close_as_cancelled();
        Ok(())
    }

    /// 顧客による取り消し
    /// 店舗が受け付ける前の注文のみ取り消せる
    pub fn cancel_by_customer(&mut self) -> Result<(), DomainError> {
        if !matches!(
            self.record.status,
            OrderStatus::PendingPayment | OrderStatus::ToBeConfirmed
        ) {
            return Err(DomainError::InvalidOrderState(
                "店舗が受け付けた注文は取り消せません。店舗に連絡してください".to_string(),
            ));
        }
        self.cancel("顧客による取り消し".to_string())
    }

    fn ensure_reason_len(reason: &str) -> Result<(), DomainError> {
        if reason.chars().count() > Self::MAX_REASON_LEN {
            return Err(DomainError::Validation(format!(
                "理由は{}文字以内で入力してください",
                Self::MAX_REASON_LEN
            )));
        }
        Ok(())
    }

    fn close_as_cancelled(&mut self) {
        if self.record.pay_status == PayStatus::Paid {
            self.record.pay_status = PayStatus::Refunded;
        }
        self.record.status = OrderStatus::Cancelled;
        self.record.cancel_time = Some(Utc::now());
    }

    /// 配達を開始
    /// 事前条件: ステータスがConfirmed
    pub fn start_delivery(&mut self) -> Result<(), DomainError> {
        if self.record.status != OrderStatus::Confirmed {
            return Err(DomainError::InvalidOrderState(
                "配達を開始できるのは受付済みの注文のみです".to_string(),
            ));
        }
        self.record.status = OrderStatus::DeliveryInProgress;
        Ok(())
    }

    /// 配達完了
    /// 事前条件: ステータスがDeliveryInProgress
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.record.status != OrderStatus::DeliveryInProgress {
            return Err(DomainError::InvalidOrderState(
                "完了にできるのは配達中の注文のみです".to_string(),
            ));
        }
        self.record.status = OrderStatus::Completed;
        self.record.delivery_time = Some(Utc::now());
        Ok(())
    }

    /// 支払い期限を過ぎているか
    pub fn is_payment_overdue(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.record.status == OrderStatus::PendingPayment && self.record.order_time + timeout < now
    }

    /// 配達中のまま一定時間が経過しているか
    pub fn is_delivery_overdue(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.record.status == OrderStatus::DeliveryInProgress && self.record.order_time + timeout < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AddressDraft, CartItemId, CartProduct};

    fn address(user_id: UserId) -> AddressBook {
        AddressBook::new(
            AddressBookId::new(),
            user_id,
            AddressDraft {
                consignee: "韓梅梅".to_string(),
                phone: "13700000000".to_string(),
                sex: "0".to_string(),
                province_name: "上海市".to_string(),
                city_name: "上海市".to_string(),
                district_name: "浦東新区".to_string(),
                detail: "世紀大道100号".to_string(),
                label: "自宅".to_string(),
            },
        )
        .unwrap()
    }

    fn cart(user_id: UserId) -> ShoppingCart {
        let mut item = CartItem::new(
            CartItemId::new(),
            user_id,
            CartProduct::Dish {
                dish_id: DishId::new(),
                flavor: Some("中辛".to_string()),
            },
            "水煮魚".to_string(),
            "fish.png".to_string(),
            Money::cny(4800),
        );
        item.increase().unwrap();
        ShoppingCart::new(vec![item])
    }

    fn request(address: &AddressBook) -> OrderRequest {
        OrderRequest {
            address_book_id: address.id(),
            pay_method: PayMethod::WeChat,
            remark: "パクチー抜き".to_string(),
            estimated_delivery_time: None,
            pack_amount: Money::cny(200),
            tableware_number: 2,
        }
    }

    fn placed_order() -> Order {
        let user_id = UserId::new();
        let address = address(user_id);
        Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &cart(user_id),
            request(&address),
        )
        .unwrap()
    }

    #[test]
    fn test_place_order_copies_cart_and_address() {
        let order = placed_order();

        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.pay_status(), PayStatus::Unpaid);
        // 4800 × 2 + 包装費200
        assert_eq!(order.amount().amount(), 9800);
        assert_eq!(order.details().len(), 1);
        assert_eq!(order.details()[0].dish_flavor(), Some("中辛"));
        assert_eq!(order.record().address, "上海市上海市浦東新区世紀大道100号");
    }

    #[test]
    fn test_place_order_with_empty_cart_fails() {
        let user_id = UserId::new();
        let address = address(user_id);
        let result = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &ShoppingCart::default(),
            request(&address),
        );
        assert!(matches!(result, Err(DomainError::ShoppingCartEmpty)));
    }

    #[test]
    fn test_place_order_with_foreign_address_fails() {
        let user_id = UserId::new();
        let foreign = address(UserId::new());
        let result = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &foreign,
            &cart(user_id),
            request(&foreign),
        );
        assert!(matches!(result, Err(DomainError::AddressBookMissing)));
    }

    #[test]
    fn test_mark_paid_emits_event_once() {
        let mut order = placed_order();

        assert!(order.mark_paid().unwrap());
        assert_eq!(order.status(), OrderStatus::ToBeConfirmed);
        assert_eq!(order.pay_status(), PayStatus::Paid);
        assert!(order.record().checkout_time.is_some());

        // 重複した支払い通知は無視される
        assert!(!order.mark_paid().unwrap());

        let events = order.take_domain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "OrderPaid");
    }

    #[test]
    fn test_mark_paid_on_cancelled_order_fails() {
        let mut order = placed_order();
        order.cancel("不要になった".to_string()).unwrap();
        assert!(order.mark_paid().is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order = placed_order();
        order.mark_paid().unwrap();
        order.confirm().unwrap();
        order.start_delivery().unwrap();
        order.complete().unwrap();

        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(order.record().delivery_time.is_some());
        assert!(order.cancel("遅い".to_string()).is_err());
        assert!(order.remind().is_err());
    }

    #[test]
    fn test_confirm_requires_payment() {
        let mut order = placed_order();
        assert!(matches!(
            order.confirm(),
            Err(DomainError::InvalidOrderState(_))
        ));
    }

    #[test]
    fn test_reject_paid_order_refunds() {
        let mut order = placed_order();
        order.mark_paid().unwrap();
        order.reject("食材切れ".to_string()).unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.pay_status(), PayStatus::Refunded);
        assert_eq!(order.record().rejection_reason.as_deref(), Some("食材切れ"));
        assert!(order.record().cancel_time.is_some());
    }

    #[test]
    fn test_cancel_unpaid_order_keeps_unpaid() {
        let mut order = placed_order();
        order.cancel("注文ミス".to_string()).unwrap();
        assert_eq!(order.pay_status(), PayStatus::Unpaid);
        assert!(order.cancel("二重".to_string()).is_err());
    }

    #[test]
    fn test_customer_cannot_cancel_confirmed_order() {
        let mut order = placed_order();
        order.mark_paid().unwrap();
        order.confirm().unwrap();
        assert!(order.cancel_by_customer().is_err());

        let mut waiting = placed_order();
        waiting.mark_paid().unwrap();
        waiting.cancel_by_customer().unwrap();
        assert_eq!(waiting.pay_status(), PayStatus::Refunded);
        assert_eq!(waiting.record().cancel_reason.as_deref(), Some("顧客による取り消し"));
    }

    #[test]
    fn test_remind_emits_event() {
        let mut order = placed_order();
        order.mark_paid().unwrap();
        order.take_domain_events();

        order.remind().unwrap();
        let events = order.take_domain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].order_id(), order.id());
    }

    #[test]
    fn test_payment_overdue() {
        let order = placed_order();
        let timeout = Duration::minutes(Order::PAYMENT_TIMEOUT_MINUTES);
        assert!(!order.is_payment_overdue(Utc::now(), timeout));
        assert!(order.is_payment_overdue(Utc::now() + Duration::minutes(16), timeout));
        assert!(!order.is_delivery_overdue(Utc::now() + Duration::minutes(90), timeout));
    }

    #[test]
    fn test_order_detail_requires_single_target() {
        let both = OrderDetail::new(
            "x".to_string(),
            String::new(),
            Some(DishId::new()),
            Some(SetmealId::new()),
            None,
            1,
            Money::cny(100),
        );
        assert!(both.is_err());
    }

    #[test]
    fn test_status_codes() {
        for code in 1..=6 {
            assert_eq!(OrderStatus::from_code(code).unwrap().code(), code);
        }
        assert!(OrderStatus::from_code(0).is_err());
        assert!(PayMethod::from_code(3).is_err());
        assert_eq!(PayStatus::from_code(2).unwrap(), PayStatus::Refunded);
    }

    #[test]
    fn test_pack_amount_overflow_is_rejected() {
        let user_id = UserId::new();
        let address = address(user_id);
        let result = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &cart(user_id),
            OrderRequest {
                pack_amount: Money::cny(i64::MAX),
                ..request(&address)
            },
        );
        assert!(matches!(result, Err(DomainError::AmountOverflow)));
    }

    #[test]
    fn test_long_remark_and_reason_are_rejected() {
        let user_id = UserId::new();
        let address = address(user_id);
        let result = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &cart(user_id),
            OrderRequest {
                remark: "辛".repeat(Order::MAX_REMARK_LEN + 1),
                ..request(&address)
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let mut order = placed_order();
        let long_reason = "無".repeat(Order::MAX_REASON_LEN + 1);
        assert!(matches!(
            order.cancel(long_reason),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(order.status(), OrderStatus::PendingPayment);
    }

    #[test]
    fn test_loaded_status_tracks_persisted_state() {
        let mut order = placed_order();
        order.mark_paid().unwrap();
        assert_eq!(order.loaded_status(), OrderStatus::PendingPayment);

        let reloaded = Order::reconstruct(order.record().clone(), order.details().to_vec());
        assert_eq!(reloaded.loaded_status(), OrderStatus::ToBeConfirmed);
    }

    #[test]
    fn test_detail_subtotal() {
        let detail = OrderDetail::new(
            "餃子".to_string(),
            String::new(),
            Some(DishId::new()),
            None,
            None,
            3,
            Money::cny(1500),
        )
        .unwrap();
        assert_eq!(detail.subtotal(), Ok(Money::cny(4500)));
    }
}
