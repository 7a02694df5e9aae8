use crate::application::ApplicationError;
use crate::domain::model::{Order, OrderId, OrderStatus, Page, PageRequest, UserId};
use crate::domain::port::{OrderQuery, OrderRepository};
use std::sync::Arc;

/// 対応待ち注文の件数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatistics {
    pub to_be_confirmed: u64,
    pub confirmed: u64,
    pub delivery_in_progress: u64,
}

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 注文IDで注文を取得（管理コンソール用）
    ///
    /// # Returns
    /// * `Ok(Order)` - 注文明細を含む注文
    /// * `Err(ApplicationError::NotFound)` - 注文が見つからなかった
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", id)))
    }

    /// 顧客本人の注文を取得
    pub async fn get_user_order(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Order, ApplicationError> {
        let order = self.get_order(id).await?;
        if order.user_id() != user_id {
            return Err(ApplicationError::NotFound(format!(
                "注文が見つかりません: {}",
                id
            )));
        }
        Ok(order)
    }

    /// 条件で注文を検索（管理コンソール用）
    /// 注文日時の降順で並べて返す
    pub async fn condition_search(
        &self,
        status: Option<OrderStatus>,
        number: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Order>, ApplicationError> {
        let query = OrderQuery {
            status,
            number: number.filter(|n| !n.trim().is_empty()),
            user_id: None,
        };
        self.order_repository
            .find_page(&query, page)
            .await
            .map_err(ApplicationError::from)
    }

    /// 顧客の注文履歴
    /// 注文日時の降順で並べて返す
    pub async fn history(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, ApplicationError> {
        let query = OrderQuery {
            status,
            number: None,
            user_id: Some(user_id),
        };
        self.order_repository
            .find_page(&query, page)
            .await
            .map_err(ApplicationError::from)
    }

    /// 受付待ち・受付済み・配達中の注文件数
    pub async fn statistics(&self) -> Result<OrderStatistics, ApplicationError> {
        Ok(OrderStatistics {
            to_be_confirmed: self.count(OrderStatus::ToBeConfirmed).await?,
            confirmed: self.count(OrderStatus::Confirmed).await?,
            delivery_in_progress: self.count(OrderStatus::DeliveryInProgress).await?,
        })
    }

    async fn count(&self, status: OrderStatus) -> Result<u64, ApplicationError> {
        let query = OrderQuery {
            status: Some(status),
            ..OrderQuery::default()
        };
        let page = self
            .order_repository
            .find_page(&query, PageRequest::new(Some(1), Some(1)))
            .await?;
        Ok(page.total)
    }
}
