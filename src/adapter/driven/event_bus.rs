use crate::domain::event::{DomainEvent, OrderPaid, OrderReminded};
use crate::domain::event_bus::{
    DynEventHandler, EventHandler, HandlerError, OrderPaidHandlerWrapper,
    OrderRemindedHandlerWrapper,
};
use crate::domain::port::{EventBus, EventBusError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};

/// 失敗したイベント処理の情報
#[derive(Debug, Clone)]
pub struct FailedEventProcessing {
    pub event: DomainEvent,
    pub handler_name: String,
    pub error: String,
    pub attempt_count: u32,
    pub failed_at: SystemTime,
    pub is_retryable: bool,
}

/// デッドレターキューエントリ
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub failed_processing: FailedEventProcessing,
    pub added_at: SystemTime,
}

/// イベントバス設定
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 最大試行回数
    pub max_retry_attempts: u32,
    /// リトライ間隔
    pub retry_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
    /// ハンドラータイムアウト
    pub handler_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(200),
            dead_letter_queue_max_size: 1000,
            handler_timeout: Duration::from_secs(5),
        }
    }
}

/// インメモリイベントバス実装
/// ハンドラーを発行元のタスク内で順番に実行する。
/// 失敗したハンドラーはリトライし、それでも失敗したらデッドレターキューに積む
pub struct InMemoryEventBus {
    handlers: Arc<RwLock<Vec<Box<dyn DynEventHandler>>>>,
    dead_letter_queue: Arc<Mutex<VecDeque<DeadLetterEntry>>>,
    config: EventBusConfig,
}

impl InMemoryEventBus {
    /// 設定を指定してインメモリイベントバスを作成
    ///
    /// # 例
    /// ```
    /// use sky_take_out::adapter::driven::{EventBusConfig, InMemoryEventBus};
    ///
    /// let config = EventBusConfig {
    ///     max_retry_attempts: 5,
    ///     retry_delay: std::time::Duration::from_millis(100),
    ///     ..EventBusConfig::default()
    /// };
    /// let event_bus = InMemoryEventBus::new(config);
    /// ```
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            dead_letter_queue: Arc::new(Mutex::new(VecDeque::new())),
            config,
        }
    }

    /// ハンドラーの実行（エラー処理とリトライ機能付き）
    async fn execute_handler_with_retry(
        &self,
        handler: &dyn DynEventHandler,
        event: &DomainEvent,
    ) -> Result<(), (HandlerError, u32)> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.config.max_retry_attempts {
            attempts += 1;

            let result =
                tokio::time::timeout(self.config.handler_timeout, handler.handle_event(event))
                    .await;

            match result {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(handler_error)) => {
                    tracing::warn!(
                        handler = handler.handler_name(),
                        attempt = attempts,
                        error = %handler_error,
                        "イベントハンドラーが失敗しました"
                    );
                    let permanent = matches!(handler_error, HandlerError::PermanentError(_));
                    last_error = Some(handler_error);

                    // 永続的エラーの場合はリトライしない
                    if permanent {
                        break;
                    }
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        handler = handler.handler_name(),
                        attempt = attempts,
                        "イベントハンドラーがタイムアウトしました"
                    );
                    last_error = Some(HandlerError::TransientError("Handler timeout".to_string()));
                }
            }

            if attempts < self.config.max_retry_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        let error =
            last_error.unwrap_or_else(|| HandlerError::ProcessingFailed("Unknown error".to_string()));
        Err((error, attempts))
    }

    /// 失敗したイベントをデッドレターキューに追加
    async fn add_to_dead_letter_queue(
        &self,
        event: DomainEvent,
        handler_name: String,
        error: &HandlerError,
        attempt_count: u32,
    ) {
        let mut dlq = self.dead_letter_queue.lock().await;

        // 上限を超えたら古いエントリから捨てる
        if dlq.len() >= self.config.dead_letter_queue_max_size {
            dlq.pop_front();
        }

        let now = SystemTime::now();
        dlq.push_back(DeadLetterEntry {
            failed_processing: FailedEventProcessing {
                event,
                handler_name,
                error: error.to_string(),
                attempt_count,
                failed_at: now,
                is_retryable: matches!(error, HandlerError::TransientError(_)),
            },
            added_at: now,
        });
    }

    /// デッドレターキューの内容を取得
    pub async fn dead_letters(&self) -> Vec<DeadLetterEntry> {
        self.dead_letter_queue.lock().await.iter().cloned().collect()
    }

    async fn register(&self, handler: Box<dyn DynEventHandler>) {
        tracing::debug!(handler = handler.handler_name(), "イベントハンドラーを登録しました");
        self.handlers.write().await.push(handler);
    }

    /// OrderPaidハンドラーを登録
    pub async fn subscribe_order_paid<H>(&self, handler: H) -> Result<(), EventBusError>
    where
        H: EventHandler<OrderPaid> + 'static,
    {
        self.register(Box::new(OrderPaidHandlerWrapper::new(handler)))
            .await;
        Ok(())
    }

    /// OrderRemindedハンドラーを登録
    pub async fn subscribe_order_reminded<H>(&self, handler: H) -> Result<(), EventBusError>
    where
        H: EventHandler<OrderReminded> + 'static,
    {
        self.register(Box::new(OrderRemindedHandlerWrapper::new(handler)))
            .await;
        Ok(())
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

// ハンドラーとデッドレターキューは共有する
impl Clone for InMemoryEventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            dead_letter_queue: self.dead_letter_queue.clone(),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        tracing::debug!(
            event_type = event.event_type(),
            event_id = %event.metadata().event_id,
            order_id = %event.order_id(),
            "イベントを発行します"
        );

        let handlers = self.handlers.read().await;
        for handler in handlers.iter().filter(|h| h.can_handle(&event)) {
            if let Err((error, attempts)) = self
                .execute_handler_with_retry(handler.as_ref(), &event)
                .await
            {
                tracing::error!(
                    handler = handler.handler_name(),
                    event_type = event.event_type(),
                    error = %error,
                    "イベント処理をデッドレターキューに移しました"
                );
                self.add_to_dead_letter_queue(
                    event.clone(),
                    handler.handler_name().to_string(),
                    &error,
                    attempts,
                )
                .await;
            }
        }

        Ok(())
    }
}
