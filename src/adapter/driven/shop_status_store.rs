use crate::domain::model::ShopStatus;
use crate::domain::port::{ShopStatusError, ShopStatusStore};
use async_trait::async_trait;
use std::sync::RwLock;

/// プロセス内で営業状態を保持するストア
/// 起動直後は休業中
pub struct InMemoryShopStatusStore {
    status: RwLock<ShopStatus>,
}

impl InMemoryShopStatusStore {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(ShopStatus::Closed),
        }
    }
}

impl Default for InMemoryShopStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShopStatusStore for InMemoryShopStatusStore {
    async fn get(&self) -> Result<ShopStatus, ShopStatusError> {
        self.status
            .read()
            .map(|status| *status)
            .map_err(|e| ShopStatusError::Unavailable(e.to_string()))
    }

    async fn set(&self, status: ShopStatus) -> Result<(), ShopStatusError> {
        let mut current = self
            .status
            .write()
            .map_err(|e| ShopStatusError::Unavailable(e.to_string()))?;
        *current = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_until_opened() {
        let store = InMemoryShopStatusStore::new();
        assert_eq!(store.get().await.unwrap(), ShopStatus::Closed);

        store.set(ShopStatus::Open).await.unwrap();
        assert_eq!(store.get().await.unwrap(), ShopStatus::Open);
    }
}
