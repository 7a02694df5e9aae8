use crate::application::ApplicationError;
use crate::domain::model::{AddressBook, AddressBookId, AddressDraft, UserId};
use crate::domain::port::AddressBookRepository;
use std::sync::Arc;

/// 配送先住所アプリケーションサービス
/// 顧客は自分の住所のみ参照・変更できる
pub struct AddressBookApplicationService {
    address_book_repository: Arc<dyn AddressBookRepository>,
}

impl AddressBookApplicationService {
    pub fn new(address_book_repository: Arc<dyn AddressBookRepository>) -> Self {
        Self {
            address_book_repository,
        }
    }

    /// 住所を追加
    pub async fn add(
        &self,
        user_id: UserId,
        draft: AddressDraft,
    ) -> Result<AddressBookId, ApplicationError> {
        let id = self.address_book_repository.next_identity();
        let address = AddressBook::new(id, user_id, draft)?;
        self.address_book_repository.save(&address).await?;
        Ok(id)
    }

    /// 顧客の住所一覧
    pub async fn list(&self, user_id: UserId) -> Result<Vec<AddressBook>, ApplicationError> {
        self.address_book_repository
            .find_by_user(user_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// IDで住所を取得
    /// 他の顧客の住所は存在しないものとして扱う
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressBookId,
    ) -> Result<AddressBook, ApplicationError> {
        self.address_book_repository
            .find_by_id(id)
            .await?
            .filter(|address| address.user_id() == user_id)
            .ok_or_else(|| ApplicationError::NotFound(format!("住所が見つかりません: {}", id)))
    }

    /// デフォルトの住所を取得
    pub async fn get_default(&self, user_id: UserId) -> Result<AddressBook, ApplicationError> {
        self.list(user_id)
            .await?
            .into_iter()
            .find(AddressBook::is_default)
            .ok_or_else(|| ApplicationError::NotFound("デフォルトの住所がありません".to_string()))
    }

    /// 住所を更新
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressBookId,
        draft: AddressDraft,
    ) -> Result<(), ApplicationError> {
        let current = self.get(user_id, id).await?;
        let mut address = AddressBook::new(id, user_id, draft)?;
        address.set_default(current.is_default());
        self.address_book_repository.save(&address).await?;
        Ok(())
    }

    /// デフォルトの住所に設定
    /// 同じ顧客の他の住所はデフォルトでなくなる
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressBookId,
    ) -> Result<(), ApplicationError> {
        self.get(user_id, id).await?;
        self.address_book_repository
            .mark_default(user_id, id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 住所を削除
    pub async fn delete(&self, user_id: UserId, id: AddressBookId) -> Result<(), ApplicationError> {
        self.get(user_id, id).await?;
        self.address_book_repository
            .delete(id)
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryAddressBookRepository;

    fn draft(detail: &str) -> AddressDraft {
        AddressDraft {
            consignee: "李雷".to_string(),
            phone: "13900000000".to_string(),
            sex: "1".to_string(),
            province_name: "北京市".to_string(),
            city_name: "北京市".to_string(),
            district_name: "海淀区".to_string(),
            detail: detail.to_string(),
            label: "会社".to_string(),
        }
    }

    fn service() -> AddressBookApplicationService {
        AddressBookApplicationService::new(Arc::new(InMemoryAddressBookRepository::new()))
    }

    #[tokio::test]
    async fn test_set_default_is_exclusive() {
        let service = service();
        let user = UserId::new();
        let first = service.add(user, draft("中関村1号")).await.unwrap();
        let second = service.add(user, draft("中関村2号")).await.unwrap();

        service.set_default(user, first).await.unwrap();
        service.set_default(user, second).await.unwrap();

        let defaults: Vec<_> = service
            .list(user)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default())
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id(), second);
        assert_eq!(service.get_default(user).await.unwrap().id(), second);
    }

    #[tokio::test]
    async fn test_other_users_address_is_hidden() {
        let service = service();
        let owner = UserId::new();
        let id = service.add(owner, draft("五道口")).await.unwrap();

        let stranger = UserId::new();
        assert!(matches!(
            service.get(stranger, id).await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(service.set_default(stranger, id).await.is_err());
        assert!(service.delete(stranger, id).await.is_err());
        assert!(service.get(owner, id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_keeps_default_flag() {
        let service = service();
        let user = UserId::new();
        let id = service.add(user, draft("旧住所")).await.unwrap();
        service.set_default(user, id).await.unwrap();

        service.update(user, id, draft("新住所")).await.unwrap();

        let address = service.get(user, id).await.unwrap();
        assert_eq!(address.detail(), "新住所");
        assert!(address.is_default());
    }

    #[tokio::test]
    async fn test_no_default_address() {
        let service = service();
        let user = UserId::new();
        service.add(user, draft("x")).await.unwrap();
        assert!(matches!(
            service.get_default(user).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}
