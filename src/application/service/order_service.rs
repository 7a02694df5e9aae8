use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CartItem, CartProduct, Money, Order, OrderId, OrderRequest, UserId,
};
use crate::domain::port::{
    AddressBookRepository, EventBus, OrderRepository, ShopStatusStore, ShoppingCartRepository,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 注文確定の結果
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSubmitted {
    pub id: OrderId,
    pub number: String,
    pub amount: Money,
    pub order_time: DateTime<Utc>,
}

/// 注文アプリケーションサービス
/// 注文の確定から配達完了までの状態遷移を担当
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    address_book_repository: Arc<dyn AddressBookRepository>,
    shopping_cart_repository: Arc<dyn ShoppingCartRepository>,
    shop_status_store: Arc<dyn ShopStatusStore>,
    event_bus: Arc<dyn EventBus>,
}

impl OrderApplicationService {
    /// 新しい注文アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `address_book_repository` - 配送先住所リポジトリ
    /// * `shopping_cart_repository` - ショッピングカートリポジトリ
    /// * `shop_status_store` - 営業状態ストア
    /// * `event_bus` - イベントバス
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        address_book_repository: Arc<dyn AddressBookRepository>,
        shopping_cart_repository: Arc<dyn ShoppingCartRepository>,
        shop_status_store: Arc<dyn ShopStatusStore>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            order_repository,
            address_book_repository,
            shopping_cart_repository,
            shop_status_store,
            event_bus,
        }
    }

    /// カートの内容で注文を確定
    /// 注文と注文明細の登録、カートのクリアは一つのトランザクションで行う
    ///
    /// # Returns
    /// * `Ok(OrderSubmitted)` - 注文ID、注文番号、金額、注文日時
    /// * `Err(ApplicationError::DomainError)` - 営業時間外、住所なし、カートが空
    pub async fn submit_order(
        &self,
        user_id: UserId,
        request: OrderRequest,
    ) -> Result<OrderSubmitted, ApplicationError> {
        if !self.shop_status_store.get().await?.is_open() {
            return Err(DomainError::ShopClosed.into());
        }

        let address = self
            .address_book_repository
            .find_by_id(request.address_book_id)
            .await?
            .ok_or(DomainError::AddressBookMissing)?;
        let cart = self.shopping_cart_repository.find_by_user(user_id).await?;

        let order = Order::place(
            self.order_repository.next_identity(),
            Order::generate_number(),
            user_id,
            &address,
            &cart,
            request,
        )?;
        self.order_repository.place(&order).await?;

        tracing::info!(
            order_id = %order.id(),
            number = order.number(),
            amount = order.amount().amount(),
            "注文を受け付けました"
        );

        Ok(OrderSubmitted {
            id: order.id(),
            number: order.number().to_string(),
            amount: order.amount(),
            order_time: order.order_time(),
        })
    }

    /// 支払い完了通知を処理
    /// 既に支払い済みの注文への通知は何もしない
    ///
    /// # Arguments
    /// * `number` - 注文番号
    pub async fn pay_success(&self, number: &str) -> Result<(), ApplicationError> {
        let mut order = self
            .order_repository
            .find_by_number(number)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", number)))?;

        if !order.mark_paid()? {
            tracing::debug!(number, "支払い済みの注文への重複通知を無視しました");
            return Ok(());
        }

        self.order_repository.save(&order).await?;
        self.publish_events(&mut order).await
    }

    /// 顧客からの催促を店舗に通知
    ///
    /// # Arguments
    /// * `user_id` - 催促した顧客（指定された場合は本人の注文のみ）
    /// * `order_id` - 注文ID
    pub async fn remind(
        &self,
        user_id: Option<UserId>,
        order_id: OrderId,
    ) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, user_id).await?;
        order.remind()?;
        self.publish_events(&mut order).await
    }

    /// 店舗が注文を受け付ける
    pub async fn confirm(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, None).await?;
        order.confirm()?;
        self.order_repository.save(&order).await?;
        Ok(())
    }

    /// 店舗が注文を拒否する（支払い済みなら返金）
    pub async fn reject(&self, order_id: OrderId, reason: String) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, None).await?;
        order.reject(reason)?;
        self.order_repository.save(&order).await?;
        tracing::info!(order_id = %order_id, pay_status = ?order.pay_status(), "注文を拒否しました");
        Ok(())
    }

    /// 店舗が注文をキャンセルする（支払い済みなら返金）
    pub async fn cancel(&self, order_id: OrderId, reason: String) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, None).await?;
        order.cancel(reason)?;
        self.order_repository.save(&order).await?;
        tracing::info!(order_id = %order_id, pay_status = ?order.pay_status(), "注文をキャンセルしました");
        Ok(())
    }

    /// 顧客が自分の注文を取り消す
    pub async fn cancel_by_customer(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, Some(user_id)).await?;
        order.cancel_by_customer()?;
        self.order_repository.save(&order).await?;
        Ok(())
    }

    /// 配達を開始
    pub async fn deliver(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, None).await?;
        order.start_delivery()?;
        self.order_repository.save(&order).await?;
        Ok(())
    }

    /// 配達完了
    pub async fn complete(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let mut order = self.find_order(order_id, None).await?;
        order.complete()?;
        self.order_repository.save(&order).await?;
        Ok(())
    }

    /// 過去の注文と同じ内容をカートに入れ直す
    /// カートに同じ商品があれば数量を加算し、なければ注文時の価格で明細を作る
    pub async fn repeat(&self, user_id: UserId, order_id: OrderId) -> Result<(), ApplicationError> {
        let order = self.find_order(order_id, Some(user_id)).await?;
        let mut lines: Vec<CartItem> = self
            .shopping_cart_repository
            .find_by_user(user_id)
            .await?
            .items()
            .to_vec();

        for detail in order.details() {
            let product = CartProduct::from_parts(
                detail.dish_id(),
                detail.setmeal_id(),
                detail.dish_flavor().map(str::to_string),
            )?;
            let item = match lines.iter_mut().find(|line| line.product() == &product) {
                Some(line) => {
                    line.increase_by(detail.number())?;
                    line.clone()
                }
                None => {
                    let item = CartItem::reconstruct(
                        self.shopping_cart_repository.next_identity(),
                        user_id,
                        product,
                        detail.name().to_string(),
                        detail.image().to_string(),
                        detail.amount(),
                        detail.number(),
                        Utc::now(),
                    )?;
                    lines.push(item.clone());
                    item
                }
            };
            self.shopping_cart_repository.save(&item).await?;
        }
        Ok(())
    }

    async fn find_order(
        &self,
        order_id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_by_id(order_id)
            .await?
            .filter(|order| owner.map_or(true, |user_id| order.user_id() == user_id))
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id)))
    }

    async fn publish_events(&self, order: &mut Order) -> Result<(), ApplicationError> {
        for event in order.take_domain_events() {
            self.event_bus
                .publish(event)
                .await
                .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;
        }
        Ok(())
    }
}
