use crate::domain::port::{NotifierError, ShopNotification, ShopNotifier};
use tokio::sync::broadcast;

/// 管理コンソールへの通知をブロードキャストチャネルで配信する
/// SSEの接続ごとに `subscribe` で受信側を作る
#[derive(Clone)]
pub struct BroadcastShopNotifier {
    sender: broadcast::Sender<ShopNotification>,
}

impl BroadcastShopNotifier {
    /// 受信側が遅れた場合に保持する通知の件数
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShopNotification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastShopNotifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ShopNotifier for BroadcastShopNotifier {
    fn notify(&self, notification: ShopNotification) -> Result<(), NotifierError> {
        // 管理コンソールが誰も接続していなければ通知は捨てる
        if self.sender.receiver_count() == 0 {
            tracing::debug!(order_id = %notification.order_id, "通知の購読者がいません");
            return Ok(());
        }
        self.sender
            .send(notification)
            .map(|_| ())
            .map_err(|e| NotifierError::DeliveryFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OrderId;
    use crate::domain::port::NotificationKind;

    fn notification() -> ShopNotification {
        ShopNotification {
            kind: NotificationKind::NewOrder,
            order_id: OrderId::new(),
            content: "注文番号：1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_notifications() {
        let notifier = BroadcastShopNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        let sent = notification();
        notifier.notify(sent.clone()).unwrap();

        assert_eq!(first.recv().await.unwrap(), sent);
        assert_eq!(second.recv().await.unwrap(), sent);
    }

    #[test]
    fn test_no_subscribers_is_not_an_error() {
        let notifier = BroadcastShopNotifier::default();
        assert!(notifier.notify(notification()).is_ok());
    }

    #[test]
    fn test_wire_format() {
        let sent = notification();
        let json = serde_json::to_value(&sent).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["orderId"], sent.order_id.to_string());
        assert_eq!(json["content"], "注文番号：1");
    }
}
