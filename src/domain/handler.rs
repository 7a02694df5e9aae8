use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::event::{OrderPaid, OrderReminded};
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::port::{NotificationKind, ShopNotification, ShopNotifier};

/// 店舗通知ハンドラー
/// 支払い完了・催促イベントを受信して管理コンソールへ通知する
pub struct ShopNotificationHandler {
    notifier: Arc<dyn ShopNotifier>,
}

impl ShopNotificationHandler {
    pub fn new(notifier: Arc<dyn ShopNotifier>) -> Self {
        Self { notifier }
    }

    fn push(&self, notification: ShopNotification) -> Result<(), HandlerError> {
        // 通知先の失敗は一時的エラーとしてリトライさせる
        self.notifier
            .notify(notification)
            .map_err(|e| HandlerError::TransientError(e.to_string()))
    }
}

#[async_trait]
impl EventHandler<OrderPaid> for ShopNotificationHandler {
    async fn handle(&self, event: OrderPaid) -> Result<(), HandlerError> {
        tracing::info!(
            correlation_id = %event.metadata.correlation_id,
            order_id = %event.order_id,
            "新規注文を店舗に通知"
        );

        self.push(ShopNotification {
            kind: NotificationKind::NewOrder,
            order_id: event.order_id,
            content: format!("注文番号：{}", event.number),
        })
    }
}

#[async_trait]
impl EventHandler<OrderReminded> for ShopNotificationHandler {
    async fn handle(&self, event: OrderReminded) -> Result<(), HandlerError> {
        tracing::info!(
            correlation_id = %event.metadata.correlation_id,
            order_id = %event.order_id,
            "催促を店舗に通知"
        );

        self.push(ShopNotification {
            kind: NotificationKind::Reminder,
            order_id: event.order_id,
            content: format!("注文番号：{}", event.number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Money, OrderId};
    use crate::domain::port::NotifierError;
    use std::sync::Mutex;

    // テスト用のモック通知先
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<ShopNotification>>,
        fail: bool,
    }

    impl ShopNotifier for RecordingNotifier {
        fn notify(&self, notification: ShopNotification) -> Result<(), NotifierError> {
            if self.fail {
                return Err(NotifierError::DeliveryFailed("no subscribers".to_string()));
            }
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_order_paid_sends_new_order_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = ShopNotificationHandler::new(notifier.clone());
        let order_id = OrderId::new();

        handler
            .handle(OrderPaid::new(order_id, "202401010001".to_string(), Money::cny(1000)))
            .await
            .unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::NewOrder);
        assert_eq!(sent[0].order_id, order_id);
        assert_eq!(sent[0].content, "注文番号：202401010001");
    }

    #[tokio::test]
    async fn test_reminder_sends_reminder_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = ShopNotificationHandler::new(notifier.clone());

        handler
            .handle(OrderReminded::new(OrderId::new(), "202401010002".to_string()))
            .await
            .unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].kind, NotificationKind::Reminder);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_transient() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let handler = ShopNotificationHandler::new(notifier);

        let result = handler
            .handle(OrderReminded::new(OrderId::new(), "1".to_string()))
            .await;
        assert!(matches!(result, Err(HandlerError::TransientError(_))));
    }

    #[test]
    fn test_notification_serializes_with_numeric_type() {
        let order_id = OrderId::new();
        let json = serde_json::to_value(ShopNotification {
            kind: NotificationKind::Reminder,
            order_id,
            content: "注文番号：1".to_string(),
        })
        .unwrap();

        assert_eq!(json["type"], 2);
        assert_eq!(json["orderId"], order_id.to_string());
    }
}
