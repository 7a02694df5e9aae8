use crate::application::ApplicationError;
use crate::domain::model::{Order, OrderStatus};
use crate::domain::port::{OrderRepository, RepositoryError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// 一回の巡回で処理した件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cancelled: usize,
    pub completed: usize,
}

/// 注文タイムアウト処理
/// 支払いされないまま放置された注文をキャンセルし、
/// 配達中のまま残った注文を完了にする
pub struct OrderTimeoutService {
    order_repository: Arc<dyn OrderRepository>,
    payment_timeout: Duration,
    delivery_timeout: Duration,
}

impl OrderTimeoutService {
    pub const TIMEOUT_CANCEL_REASON: &'static str = "注文タイムアウトによる自動キャンセル";

    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        payment_timeout: Duration,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            order_repository,
            payment_timeout,
            delivery_timeout,
        }
    }

    /// 既定のタイムアウト（支払い15分、配達60分）で作成
    pub fn with_defaults(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self::new(
            order_repository,
            Duration::minutes(Order::PAYMENT_TIMEOUT_MINUTES),
            Duration::minutes(Order::DELIVERY_TIMEOUT_MINUTES),
        )
    }

    /// 期限切れの注文を一括処理
    ///
    /// # Arguments
    /// * `now` - 判定の基準時刻
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ApplicationError> {
        let mut report = SweepReport::default();

        let pending = self
            .order_repository
            .find_by_status_before(OrderStatus::PendingPayment, now - self.payment_timeout)
            .await?;
        for mut order in pending {
            if !order.is_payment_overdue(now, self.payment_timeout) {
                continue;
            }
            order.cancel(Self::TIMEOUT_CANCEL_REASON.to_string())?;
            if self.save_unless_changed(&order).await? {
                report.cancelled += 1;
            }
        }

        let delivering = self
            .order_repository
            .find_by_status_before(OrderStatus::DeliveryInProgress, now - self.delivery_timeout)
            .await?;
        for mut order in delivering {
            if !order.is_delivery_overdue(now, self.delivery_timeout) {
                continue;
            }
            order.complete()?;
            if self.save_unless_changed(&order).await? {
                report.completed += 1;
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                cancelled = report.cancelled,
                completed = report.completed,
                "期限切れの注文を処理しました"
            );
        }
        Ok(report)
    }

    /// 読み込み後に支払い通知などで状態が変わっていた注文は処理しない
    async fn save_unless_changed(&self, order: &Order) -> Result<bool, ApplicationError> {
        match self.order_repository.save(order).await {
            Ok(()) => Ok(true),
            Err(RepositoryError::Conflict(reason)) => {
                tracing::info!(order_id = %order.id(), %reason, "状態が変わった注文をスキップしました");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 一定間隔で巡回するバックグラウンドタスクを起動
    pub fn spawn(self: Arc<Self>, interval: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep(Utc::now()).await {
                    tracing::error!(error = %e, "注文タイムアウト処理に失敗しました");
                }
            }
        })
    }
}
