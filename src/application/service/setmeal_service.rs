use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CategoryId, EmployeeId, Page, PageRequest, Setmeal, SetmealDraft, SetmealId, Status,
};
use crate::domain::port::{DishRepository, MenuQuery, SetmealRepository};
use crate::domain::service::MenuRules;
use std::collections::HashSet;
use std::sync::Arc;

/// セットメニューに含まれる菜品の表示用情報
#[derive(Debug, Clone, PartialEq)]
pub struct SetmealDishItem {
    pub name: String,
    pub copies: u32,
    pub image: String,
    pub description: String,
}

/// セットメニューアプリケーションサービス
pub struct SetmealApplicationService {
    setmeal_repository: Arc<dyn SetmealRepository>,
    dish_repository: Arc<dyn DishRepository>,
}

impl SetmealApplicationService {
    pub fn new(
        setmeal_repository: Arc<dyn SetmealRepository>,
        dish_repository: Arc<dyn DishRepository>,
    ) -> Self {
        Self {
            setmeal_repository,
            dish_repository,
        }
    }

    /// セットメニューを菜品の関連と一緒に登録
    /// 販売中として登録する場合は含まれる菜品がすべて販売中である必要がある
    pub async fn create_setmeal(
        &self,
        draft: SetmealDraft,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<SetmealId, ApplicationError> {
        let id = self.setmeal_repository.next_identity();
        let setmeal = Setmeal::new(id, draft, status, actor)?;
        if setmeal.is_on_sale() {
            self.ensure_can_enable(&setmeal).await?;
        }
        self.setmeal_repository.save(&setmeal).await?;
        Ok(id)
    }

    pub async fn page_query(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Setmeal>, ApplicationError> {
        self.setmeal_repository
            .find_page(query, page)
            .await
            .map_err(ApplicationError::from)
    }

    /// IDでセットメニューを取得（菜品の関連付き）
    pub async fn get_setmeal(&self, id: SetmealId) -> Result<Setmeal, ApplicationError> {
        self.setmeal_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("セットメニューが見つかりません: {}", id))
            })
    }

    /// セットメニューを更新
    /// 菜品の関連は全件置き換える
    pub async fn update_setmeal(
        &self,
        id: SetmealId,
        draft: SetmealDraft,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut setmeal = self.get_setmeal(id).await?;
        setmeal.update(draft, actor)?;
        if setmeal.is_on_sale() {
            self.ensure_can_enable(&setmeal).await?;
        }
        self.setmeal_repository.save(&setmeal).await?;
        Ok(())
    }

    /// セットメニューを一括削除
    /// 販売中のセットメニューが含まれる場合は何も削除しない
    pub async fn delete_setmeals(&self, ids: &[SetmealId]) -> Result<(), ApplicationError> {
        let mut seen = HashSet::new();
        let ids: Vec<SetmealId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Err(
                DomainError::Validation("削除するセットメニューを指定してください".to_string())
                    .into(),
            );
        }

        let setmeals = self.setmeal_repository.find_by_ids(&ids).await?;
        if setmeals.len() != ids.len() {
            return Err(ApplicationError::NotFound(
                "存在しないセットメニューが含まれています".to_string(),
            ));
        }
        for setmeal in &setmeals {
            setmeal.ensure_deletable()?;
        }

        // 確認後に販売開始されたものがあれば削除しない
        if !self.setmeal_repository.delete_by_ids(&ids).await? {
            return Err(DomainError::DeletionNotAllowed(
                "販売中のセットメニューは削除できません".to_string(),
            )
            .into());
        }
        tracing::info!(count = ids.len(), "セットメニューを削除しました");
        Ok(())
    }

    /// 販売開始・停止
    pub async fn change_status(
        &self,
        id: SetmealId,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut setmeal = self.get_setmeal(id).await?;
        if status.is_enabled() {
            self.ensure_can_enable(&setmeal).await?;
        }
        setmeal.change_status(status, actor);
        self.setmeal_repository.save(&setmeal).await?;
        Ok(())
    }

    /// カテゴリ内の販売中のセットメニューを取得
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Setmeal>, ApplicationError> {
        let query = MenuQuery {
            name: None,
            category_id: Some(category_id),
            status: Some(Status::Enabled),
        };
        self.setmeal_repository
            .find_all(&query)
            .await
            .map_err(ApplicationError::from)
    }

    /// セットメニューに含まれる菜品の一覧
    /// 画像と説明は菜品の現在の値を使う
    pub async fn dish_items(&self, id: SetmealId) -> Result<Vec<SetmealDishItem>, ApplicationError> {
        let setmeal = self.get_setmeal(id).await?;
        let dishes = self.dish_repository.find_by_ids(&setmeal.dish_ids()).await?;

        let items = setmeal
            .dishes()
            .iter()
            .map(|link| {
                let dish = dishes.iter().find(|d| d.id() == link.dish_id());
                SetmealDishItem {
                    name: link.name().to_string(),
                    copies: link.copies(),
                    image: dish.map(|d| d.image().to_string()).unwrap_or_default(),
                    description: dish.map(|d| d.description().to_string()).unwrap_or_default(),
                }
            })
            .collect();
        Ok(items)
    }

    async fn ensure_can_enable(&self, setmeal: &Setmeal) -> Result<(), ApplicationError> {
        let dish_ids = setmeal.dish_ids();
        let dishes = self.dish_repository.find_by_ids(&dish_ids).await?;
        MenuRules::ensure_setmeal_can_enable(&dish_ids, &dishes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::{InMemoryDishRepository, InMemorySetmealRepository};
    use crate::domain::model::{Dish, DishDraft, DishId, Money, SetmealDish};

    struct Fixture {
        service: SetmealApplicationService,
        dishes: Arc<InMemoryDishRepository>,
    }

    fn fixture() -> Fixture {
        let dishes = Arc::new(InMemoryDishRepository::new());
        let service =
            SetmealApplicationService::new(Arc::new(InMemorySetmealRepository::new()), dishes.clone());
        Fixture { service, dishes }
    }

    async fn dish(fixture: &Fixture, name: &str, status: Status) -> Dish {
        let dish = Dish::new(
            DishId::new(),
            DishDraft {
                name: name.to_string(),
                category_id: CategoryId::new(),
                price: Money::cny(2000),
                image: format!("{}.png", name),
                description: format!("{}の説明", name),
                flavors: vec![],
            },
            status,
            None,
        )
        .unwrap();
        fixture.dishes.save(&dish).await.unwrap();
        dish
    }

    fn draft(category_id: CategoryId, dishes: &[&Dish]) -> SetmealDraft {
        SetmealDraft {
            name: "家族セット".to_string(),
            category_id,
            price: Money::cny(9900),
            image: "family.png".to_string(),
            description: String::new(),
            dishes: dishes
                .iter()
                .map(|d| SetmealDish::new(d.id(), d.name().to_string(), d.price(), 2).unwrap())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_enable_with_stopped_dish_fails() {
        let fixture = fixture();
        let on = dish(&fixture, "on", Status::Enabled).await;
        let off = dish(&fixture, "off", Status::Disabled).await;
        let id = fixture
            .service
            .create_setmeal(draft(CategoryId::new(), &[&on, &off]), Status::Disabled, None)
            .await
            .unwrap();

        let result = fixture.service.change_status(id, Status::Enabled, None).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::SetmealEnableFailed(_)))
        ));
        assert_eq!(
            fixture.service.get_setmeal(id).await.unwrap().status(),
            Status::Disabled
        );
    }

    #[tokio::test]
    async fn test_enable_with_all_dishes_on_sale() {
        let fixture = fixture();
        let a = dish(&fixture, "a", Status::Enabled).await;
        let id = fixture
            .service
            .create_setmeal(draft(CategoryId::new(), &[&a]), Status::Disabled, None)
            .await
            .unwrap();

        fixture.service.change_status(id, Status::Enabled, None).await.unwrap();
        assert!(fixture.service.get_setmeal(id).await.unwrap().is_on_sale());
    }

    #[tokio::test]
    async fn test_create_with_empty_dishes_fails() {
        let fixture = fixture();
        let result = fixture
            .service
            .create_setmeal(draft(CategoryId::new(), &[]), Status::Disabled, None)
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_dish_links() {
        let fixture = fixture();
        let a = dish(&fixture, "a", Status::Enabled).await;
        let b = dish(&fixture, "b", Status::Enabled).await;
        let category = CategoryId::new();
        let id = fixture
            .service
            .create_setmeal(draft(category, &[&a]), Status::Disabled, None)
            .await
            .unwrap();

        fixture
            .service
            .update_setmeal(id, draft(category, &[&b]), None)
            .await
            .unwrap();

        let setmeal = fixture.service.get_setmeal(id).await.unwrap();
        assert_eq!(setmeal.dish_ids(), vec![b.id()]);
    }

    #[tokio::test]
    async fn test_delete_on_sale_setmeal_fails() {
        let fixture = fixture();
        let a = dish(&fixture, "a", Status::Enabled).await;
        let on_sale = fixture
            .service
            .create_setmeal(draft(CategoryId::new(), &[&a]), Status::Enabled, None)
            .await
            .unwrap();
        let stopped = fixture
            .service
            .create_setmeal(
                SetmealDraft {
                    name: "お一人様セット".to_string(),
                    ..draft(CategoryId::new(), &[&a])
                },
                Status::Disabled,
                None,
            )
            .await
            .unwrap();

        let result = fixture.service.delete_setmeals(&[on_sale, stopped]).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::DeletionNotAllowed(_)))
        ));
        assert!(fixture.service.get_setmeal(stopped).await.is_ok());

        fixture.service.delete_setmeals(&[stopped]).await.unwrap();
        assert!(fixture.service.get_setmeal(stopped).await.is_err());
    }

    #[tokio::test]
    async fn test_dish_items_use_current_dish_details() {
        let fixture = fixture();
        let a = dish(&fixture, "酸辣湯", Status::Enabled).await;
        let id = fixture
            .service
            .create_setmeal(draft(CategoryId::new(), &[&a]), Status::Disabled, None)
            .await
            .unwrap();

        let items = fixture.service.dish_items(id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].copies, 2);
        assert_eq!(items[0].image, "酸辣湯.png");
        assert_eq!(items[0].description, "酸辣湯の説明");
    }
}
