use crate::domain::model::{Money, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// イベントのメタデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// ドメインイベント列挙型
/// 店舗側へ通知が必要な出来事を表現する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// 注文の支払いが完了した（新規注文として店舗に通知）
    OrderPaid(OrderPaid),
    /// 顧客が注文を催促した
    OrderReminded(OrderReminded),
}

impl DomainEvent {
    /// イベントタイプ名
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderPaid(_) => "OrderPaid",
            DomainEvent::OrderReminded(_) => "OrderReminded",
        }
    }

    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::OrderPaid(e) => &e.metadata,
            DomainEvent::OrderReminded(e) => &e.metadata,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            DomainEvent::OrderPaid(e) => e.order_id,
            DomainEvent::OrderReminded(e) => e.order_id,
        }
    }
}

/// 支払い完了イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaid {
    pub metadata: EventMetadata,
    /// 注文ID
    pub order_id: OrderId,
    /// 注文番号
    pub number: String,
    /// 支払金額
    pub amount: Money,
}

impl OrderPaid {
    pub fn new(order_id: OrderId, number: String, amount: Money) -> Self {
        Self {
            metadata: EventMetadata::new(),
            order_id,
            number,
            amount,
        }
    }
}

/// 催促イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReminded {
    pub metadata: EventMetadata,
    /// 注文ID
    pub order_id: OrderId,
    /// 注文番号
    pub number: String,
}

impl OrderReminded {
    pub fn new(order_id: OrderId, number: String) -> Self {
        Self {
            metadata: EventMetadata::new(),
            order_id,
            number,
        }
    }
}
