use crate::domain::error::DomainError;
use crate::domain::model::{
    ensure_max_chars, AuditInfo, CategoryId, DishId, EmployeeId, Money, SetmealId, Status,
};

/// セットメニューに含まれる菜品
/// 菜品名と価格はセット登録時点の値を保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetmealDish {
    dish_id: DishId,
    name: String,
    price: Money,
    copies: u32,
}

impl SetmealDish {
    /// 新しいセット内菜品を作成
    /// 個数は1以上である必要がある
    pub fn new(dish_id: DishId, name: String, price: Money, copies: u32) -> Result<Self, DomainError> {
        if copies == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        ensure_max_chars("菜品名", &name, 32)?;
        Ok(Self {
            dish_id,
            name,
            price,
            copies,
        })
    }

    pub fn dish_id(&self) -> DishId {
        self.dish_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }
}

/// セットメニューの編集可能な属性
#[derive(Debug, Clone, PartialEq)]
pub struct SetmealDraft {
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub dishes: Vec<SetmealDish>,
}

impl SetmealDraft {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "セットメニュー名は空にできません".to_string(),
            ));
        }
        ensure_max_chars("セットメニュー名", &self.name, 32)?;
        ensure_max_chars("画像パス", &self.image, 255)?;
        ensure_max_chars("説明", &self.description, 255)?;
        if self.dishes.is_empty() {
            return Err(DomainError::Validation(
                "セットメニューには少なくとも1つの菜品が必要です".to_string(),
            ));
        }
        Ok(())
    }
}

/// セットメニュー集約
/// 本体と菜品の関連を一つの単位として扱う
#[derive(Debug, Clone, PartialEq)]
pub struct Setmeal {
    id: SetmealId,
    name: String,
    category_id: CategoryId,
    price: Money,
    image: String,
    description: String,
    status: Status,
    dishes: Vec<SetmealDish>,
    audit: AuditInfo,
}

impl Setmeal {
    /// 新しいセットメニューを作成
    pub fn new(
        id: SetmealId,
        draft: SetmealDraft,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<Self, DomainError> {
        draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            category_id: draft.category_id,
            price: draft.price,
            image: draft.image,
            description: draft.description,
            status,
            dishes: draft.dishes,
            audit: AuditInfo::created_by(actor),
        })
    }

    /// データベースから取得したデータでセットメニューを再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: SetmealId,
        name: String,
        category_id: CategoryId,
        price: Money,
        image: String,
        description: String,
        status: Status,
        dishes: Vec<SetmealDish>,
        audit: AuditInfo,
    ) -> Self {
        Self {
            id,
            name,
            category_id,
            price,
            image,
            description,
            status,
            dishes,
            audit,
        }
    }

    pub fn id(&self) -> SetmealId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn dishes(&self) -> &[SetmealDish] {
        &self.dishes
    }

    pub fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    pub fn is_on_sale(&self) -> bool {
        self.status.is_enabled()
    }

    /// 含まれる菜品のID一覧
    pub fn dish_ids(&self) -> Vec<DishId> {
        self.dishes.iter().map(|d| d.dish_id()).collect()
    }

    /// 属性と菜品の関連をまとめて置き換える
    pub fn update(&mut self, draft: SetmealDraft, actor: Option<EmployeeId>) -> Result<(), DomainError> {
        draft.validate()?;
        self.name = draft.name;
        self.category_id = draft.category_id;
        self.price = draft.price;
        self.image = draft.image;
        self.description = draft.description;
        self.dishes = draft.dishes;
        self.audit.touch(actor);
        Ok(())
    }

    /// 販売開始・停止
    /// 販売開始の可否は呼び出し側でドメインサービスを使って検証する
    pub fn change_status(&mut self, status: Status, actor: Option<EmployeeId>) {
        self.status = status;
        self.audit.touch(actor);
    }

    /// 削除可能か検証
    /// 販売中のセットメニューは削除できない
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.is_on_sale() {
            return Err(DomainError::DeletionNotAllowed(format!(
                "販売中のセットメニューは削除できません: {}",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(copies: u32) -> SetmealDish {
        SetmealDish::new(DishId::new(), "回鍋肉".to_string(), Money::cny(3200), copies).unwrap()
    }

    fn draft(dishes: Vec<SetmealDish>) -> SetmealDraft {
        SetmealDraft {
            name: "ランチセットA".to_string(),
            category_id: CategoryId::new(),
            price: Money::cny(4500),
            image: "a.png".to_string(),
            description: String::new(),
            dishes,
        }
    }

    #[test]
    fn test_setmeal_dish_requires_positive_copies() {
        assert_eq!(
            SetmealDish::new(DishId::new(), "x".to_string(), Money::cny(1), 0),
            Err(DomainError::InvalidQuantity)
        );
    }

    #[test]
    fn test_setmeal_requires_dishes() {
        let result = Setmeal::new(SetmealId::new(), draft(vec![]), Status::Disabled, None);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_fields_longer_than_columns_are_rejected() {
        let mut long_name = draft(vec![item(1)]);
        long_name.name = "套".repeat(33);
        assert!(Setmeal::new(SetmealId::new(), long_name, Status::Disabled, None).is_err());

        let mut long_description = draft(vec![item(1)]);
        long_description.description = "d".repeat(256);
        assert!(Setmeal::new(SetmealId::new(), long_description, Status::Disabled, None).is_err());

        let result = SetmealDish::new(DishId::new(), "肉".repeat(33), Money::cny(1), 1);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_update_replaces_dishes() {
        let mut setmeal =
            Setmeal::new(SetmealId::new(), draft(vec![item(1), item(2)]), Status::Disabled, None)
                .unwrap();
        let replacement = item(3);

        setmeal.update(draft(vec![replacement.clone()]), None).unwrap();

        assert_eq!(setmeal.dishes(), &[replacement.clone()]);
        assert_eq!(setmeal.dish_ids(), vec![replacement.dish_id()]);
    }

    #[test]
    fn test_on_sale_setmeal_is_not_deletable() {
        let setmeal =
            Setmeal::new(SetmealId::new(), draft(vec![item(1)]), Status::Enabled, None).unwrap();
        assert!(matches!(
            setmeal.ensure_deletable(),
            Err(DomainError::DeletionNotAllowed(_))
        ));
    }
}
