use crate::application::ApplicationError;
use crate::domain::model::ShopStatus;
use crate::domain::port::ShopStatusStore;
use std::sync::Arc;

/// 店舗営業状態サービス
pub struct ShopApplicationService {
    shop_status_store: Arc<dyn ShopStatusStore>,
}

impl ShopApplicationService {
    pub fn new(shop_status_store: Arc<dyn ShopStatusStore>) -> Self {
        Self { shop_status_store }
    }

    /// 営業状態を設定
    pub async fn set_status(&self, status: ShopStatus) -> Result<(), ApplicationError> {
        self.shop_status_store.set(status).await?;
        tracing::info!(status = status.code(), "店舗の営業状態を変更しました");
        Ok(())
    }

    /// 営業状態を取得
    /// 一度も設定されていない場合は営業時間外
    pub async fn get_status(&self) -> Result<ShopStatus, ApplicationError> {
        self.shop_status_store
            .get()
            .await
            .map_err(ApplicationError::from)
    }
}
