use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CategoryId, Dish, DishDraft, DishId, EmployeeId, Page, PageRequest, Status,
};
use crate::domain::port::{DishRepository, MenuQuery, SetmealRepository};
use crate::domain::service::MenuRules;
use std::collections::HashSet;
use std::sync::Arc;

/// 菜品アプリケーションサービス
pub struct DishApplicationService {
    dish_repository: Arc<dyn DishRepository>,
    setmeal_repository: Arc<dyn SetmealRepository>,
}

impl DishApplicationService {
    /// 新しい菜品アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `dish_repository` - 菜品リポジトリ
    /// * `setmeal_repository` - セットメニューリポジトリ（削除・販売停止時の参照確認用）
    pub fn new(
        dish_repository: Arc<dyn DishRepository>,
        setmeal_repository: Arc<dyn SetmealRepository>,
    ) -> Self {
        Self {
            dish_repository,
            setmeal_repository,
        }
    }

    /// 菜品を味付けオプションと一緒に登録
    pub async fn create_dish(
        &self,
        draft: DishDraft,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<DishId, ApplicationError> {
        let id = self.dish_repository.next_identity();
        let dish = Dish::new(id, draft, status, actor)?;
        self.dish_repository.save(&dish).await?;
        Ok(id)
    }

    /// 条件でページング検索
    pub async fn page_query(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Dish>, ApplicationError> {
        self.dish_repository
            .find_page(query, page)
            .await
            .map_err(ApplicationError::from)
    }

    /// 菜品を一括削除
    ///
    /// # Returns
    /// * `Err(ApplicationError::NotFound)` - 存在しないIDが含まれる
    /// * `Err(ApplicationError::DomainError)` - 販売中、またはセットメニューに含まれる菜品がある
    pub async fn delete_dishes(&self, ids: &[DishId]) -> Result<(), ApplicationError> {
        let ids = unique(ids);
        if ids.is_empty() {
            return Err(DomainError::Validation("削除する菜品を指定してください".to_string()).into());
        }

        let dishes = self.dish_repository.find_by_ids(&ids).await?;
        if dishes.len() != ids.len() {
            return Err(ApplicationError::NotFound(
                "存在しない菜品が含まれています".to_string(),
            ));
        }

        let referencing = self.setmeal_repository.find_ids_by_dish_ids(&ids).await?;
        MenuRules::ensure_dishes_deletable(&dishes, &referencing)?;

        // 確認後に販売開始やセットメニューへの追加があれば削除しない
        if !self.dish_repository.delete_by_ids(&ids).await? {
            return Err(DomainError::DeletionNotAllowed(
                "販売中、またはセットメニューに含まれる菜品は削除できません".to_string(),
            )
            .into());
        }
        tracing::info!(count = ids.len(), "菜品を削除しました");
        Ok(())
    }

    /// IDで菜品を取得（味付けオプション付き）
    pub async fn get_dish(&self, id: DishId) -> Result<Dish, ApplicationError> {
        self.dish_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("菜品が見つかりません: {}", id)))
    }

    /// 菜品と味付けオプションを更新
    pub async fn update_dish(
        &self,
        id: DishId,
        draft: DishDraft,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut dish = self.get_dish(id).await?;
        dish.update(draft, actor)?;
        self.dish_repository.save(&dish).await?;
        Ok(())
    }

    /// 販売開始・停止
    /// 販売停止にした場合、その菜品を含む販売中のセットメニューも停止する
    pub async fn change_status(
        &self,
        id: DishId,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut dish = self.get_dish(id).await?;
        dish.change_status(status, actor);

        if status == Status::Enabled {
            self.dish_repository.save(&dish).await?;
            return Ok(());
        }

        let stopped = self.dish_repository.stop_sale(&dish, actor).await?;
        for setmeal_id in stopped {
            tracing::info!(
                dish_id = %id,
                setmeal_id = %setmeal_id,
                "菜品の販売停止に伴いセットメニューを停止しました"
            );
        }
        Ok(())
    }

    /// カテゴリ内の販売中の菜品を取得
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Dish>, ApplicationError> {
        let query = MenuQuery {
            name: None,
            category_id: Some(category_id),
            status: Some(Status::Enabled),
        };
        self.dish_repository
            .find_all(&query)
            .await
            .map_err(ApplicationError::from)
    }
}

fn unique(ids: &[DishId]) -> Vec<DishId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::{InMemoryDishRepository, InMemorySetmealRepository};
    use crate::domain::model::{DishFlavor, Money, Setmeal, SetmealDish, SetmealDraft, SetmealId};

    struct Fixture {
        service: DishApplicationService,
        dishes: Arc<InMemoryDishRepository>,
        setmeals: Arc<InMemorySetmealRepository>,
    }

    fn fixture() -> Fixture {
        let setmeals = InMemorySetmealRepository::new();
        let dishes = Arc::new(InMemoryDishRepository::with_setmeals(setmeals.clone()));
        let setmeals = Arc::new(setmeals);
        let service = DishApplicationService::new(dishes.clone(), setmeals.clone());
        Fixture {
            service,
            dishes,
            setmeals,
        }
    }

    fn draft(name: &str, category_id: CategoryId) -> DishDraft {
        DishDraft {
            name: name.to_string(),
            category_id,
            price: Money::cny(3800),
            image: format!("{}.png", name),
            description: String::new(),
            flavors: vec![DishFlavor::new("辛さ".to_string(), "[\"微辣\",\"中辣\"]".to_string()).unwrap()],
        }
    }

    async fn setmeal_with(fixture: &Fixture, dish_id: DishId, status: Status) -> Setmeal {
        let setmeal = Setmeal::new(
            SetmealId::new(),
            SetmealDraft {
                name: "ランチセット".to_string(),
                category_id: CategoryId::new(),
                price: Money::cny(5000),
                image: String::new(),
                description: String::new(),
                dishes: vec![SetmealDish::new(dish_id, "x".to_string(), Money::cny(3800), 1).unwrap()],
            },
            status,
            None,
        )
        .unwrap();
        fixture.setmeals.save(&setmeal).await.unwrap();
        setmeal
    }

    #[tokio::test]
    async fn test_create_and_get_dish_with_flavors() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("麻婆豆腐", CategoryId::new()), Status::Disabled, None)
            .await
            .unwrap();

        let dish = fixture.service.get_dish(id).await.unwrap();
        assert_eq!(dish.name(), "麻婆豆腐");
        assert_eq!(dish.flavors().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_on_sale_dish_fails() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("回鍋肉", CategoryId::new()), Status::Enabled, None)
            .await
            .unwrap();

        let result = fixture.service.delete_dishes(&[id]).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::DeletionNotAllowed(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_dish_in_setmeal_fails() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("青椒肉絲", CategoryId::new()), Status::Disabled, None)
            .await
            .unwrap();
        setmeal_with(&fixture, id, Status::Disabled).await;

        let result = fixture.service.delete_dishes(&[id]).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::DeletionNotAllowed(_)))
        ));
        assert!(fixture.service.get_dish(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_dish_is_not_found() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("酢豚", CategoryId::new()), Status::Disabled, None)
            .await
            .unwrap();

        let result = fixture.service.delete_dishes(&[id, DishId::new()]).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_stopped_dishes() {
        let fixture = fixture();
        let category = CategoryId::new();
        let a = fixture.service.create_dish(draft("a", category), Status::Disabled, None).await.unwrap();
        let b = fixture.service.create_dish(draft("b", category), Status::Disabled, None).await.unwrap();

        fixture.service.delete_dishes(&[a, b, a]).await.unwrap();
        assert!(matches!(
            fixture.service.get_dish(a).await,
            Err(ApplicationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stopping_dish_stops_setmeals() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("担担麺", CategoryId::new()), Status::Enabled, None)
            .await
            .unwrap();
        let setmeal = setmeal_with(&fixture, id, Status::Enabled).await;

        fixture.service.change_status(id, Status::Disabled, None).await.unwrap();

        let stored = fixture.setmeals.find_by_id(setmeal.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), Status::Disabled);
    }

    #[tokio::test]
    async fn test_list_by_category_returns_enabled_only() {
        let fixture = fixture();
        let category = CategoryId::new();
        fixture.service.create_dish(draft("on", category), Status::Enabled, None).await.unwrap();
        fixture.service.create_dish(draft("off", category), Status::Disabled, None).await.unwrap();
        fixture.service.create_dish(draft("other", CategoryId::new()), Status::Enabled, None).await.unwrap();

        let dishes = fixture.service.list_by_category(category).await.unwrap();
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name(), "on");
    }

    #[tokio::test]
    async fn test_update_replaces_flavors() {
        let fixture = fixture();
        let category = CategoryId::new();
        let id = fixture.service.create_dish(draft("魚香肉絲", category), Status::Disabled, None).await.unwrap();

        let mut updated = draft("魚香肉絲", category);
        updated.flavors = vec![];
        updated.price = Money::cny(4200);
        fixture.service.update_dish(id, updated, None).await.unwrap();

        let dish = fixture.service.get_dish(id).await.unwrap();
        assert!(dish.flavors().is_empty());
        assert_eq!(dish.price(), Money::cny(4200));
    }

    #[tokio::test]
    async fn test_delete_rechecks_inside_repository() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("宮保鶏丁", CategoryId::new()), Status::Disabled, None)
            .await
            .unwrap();

        // 確認の後でセットメニューに追加された場合
        setmeal_with(&fixture, id, Status::Disabled).await;
        assert!(!fixture.dishes.delete_by_ids(&[id]).await.unwrap());

        // 確認の後で販売開始された場合
        let other = fixture
            .service
            .create_dish(draft("棒棒鶏", CategoryId::new()), Status::Disabled, None)
            .await
            .unwrap();
        fixture.service.change_status(other, Status::Enabled, None).await.unwrap();
        assert!(!fixture.dishes.delete_by_ids(&[other]).await.unwrap());

        assert!(fixture.service.get_dish(id).await.is_ok());
        assert!(fixture.service.get_dish(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_sale_leaves_stopped_setmeals_alone() {
        let fixture = fixture();
        let id = fixture
            .service
            .create_dish(draft("餃子", CategoryId::new()), Status::Enabled, None)
            .await
            .unwrap();
        let on_sale = setmeal_with(&fixture, id, Status::Enabled).await;
        let mut dish = fixture.service.get_dish(id).await.unwrap();
        dish.change_status(Status::Disabled, None);

        let stopped = fixture.dishes.stop_sale(&dish, None).await.unwrap();

        assert_eq!(stopped, vec![on_sale.id()]);
        assert_eq!(
            fixture.service.get_dish(id).await.unwrap().status(),
            Status::Disabled
        );
        assert!(fixture.dishes.stop_sale(&dish, None).await.unwrap().is_empty());
    }
}
