use crate::domain::event::{DomainEvent, OrderPaid, OrderReminded};
use async_trait::async_trait;

/// イベントハンドラーエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Transient error (retryable): {0}")]
    TransientError(String),
    #[error("Permanent error (not retryable): {0}")]
    PermanentError(String),
}

/// イベントハンドラートレイト
/// 特定のイベントタイプを処理するハンドラーを定義
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: E) -> Result<(), HandlerError>;
}

/// 型消去されたイベントハンドラー
/// 異なるイベントタイプのハンドラーを統一的に扱うため
#[async_trait]
pub trait DynEventHandler: Send + Sync {
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError>;
    fn can_handle(&self, event: &DomainEvent) -> bool;
    fn handler_name(&self) -> &str;
}

/// OrderPaid用のハンドラーラッパー
pub struct OrderPaidHandlerWrapper<H>
where
    H: EventHandler<OrderPaid>,
{
    handler: H,
    name: String,
}

impl<H> OrderPaidHandlerWrapper<H>
where
    H: EventHandler<OrderPaid>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "OrderPaidHandler".to_string(),
        }
    }
}

#[async_trait]
impl<H> DynEventHandler for OrderPaidHandlerWrapper<H>
where
    H: EventHandler<OrderPaid>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::OrderPaid(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::PermanentError(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::OrderPaid(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// OrderReminded用のハンドラーラッパー
pub struct OrderRemindedHandlerWrapper<H>
where
    H: EventHandler<OrderReminded>,
{
    handler: H,
    name: String,
}

impl<H> OrderRemindedHandlerWrapper<H>
where
    H: EventHandler<OrderReminded>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "OrderRemindedHandler".to_string(),
        }
    }
}

#[async_trait]
impl<H> DynEventHandler for OrderRemindedHandlerWrapper<H>
where
    H: EventHandler<OrderReminded>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::OrderReminded(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::PermanentError(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::OrderReminded(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}
