use crate::domain::error::DomainError;
use crate::domain::model::{
    ensure_max_chars, AuditInfo, CategoryId, DishId, EmployeeId, Money, Status,
};
use serde::{Deserialize, Serialize};

/// 菜品の味付けオプション
/// 例: name="辛さ", value=["激辛","中辛","甘口"] をJSON文字列で保持
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishFlavor {
    name: String,
    value: String,
}

impl DishFlavor {
    /// 新しい味付けオプションを作成
    pub fn new(name: String, value: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "味付けの名前は空にできません".to_string(),
            ));
        }
        ensure_max_chars("味付けの名前", &name, 32)?;
        ensure_max_chars("味付けの値", &value, 255)?;
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// 菜品の編集可能な属性
#[derive(Debug, Clone, PartialEq)]
pub struct DishDraft {
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub flavors: Vec<DishFlavor>,
}

impl DishDraft {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("菜品名は空にできません".to_string()));
        }
        ensure_max_chars("菜品名", &self.name, Dish::MAX_NAME_LEN)?;
        ensure_max_chars("画像パス", &self.image, 255)?;
        ensure_max_chars("説明", &self.description, 255)?;
        Ok(())
    }
}

/// 菜品集約
/// 菜品本体と味付けオプションを一つの単位として扱う
#[derive(Debug, Clone, PartialEq)]
pub struct Dish {
    id: DishId,
    name: String,
    category_id: CategoryId,
    price: Money,
    image: String,
    description: String,
    status: Status,
    flavors: Vec<DishFlavor>,
    audit: AuditInfo,
}

impl Dish {
    pub const MAX_NAME_LEN: usize = 32;

    /// 新しい菜品を作成
    pub fn new(
        id: DishId,
        draft: DishDraft,
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
            flavors: draft.flavors,
            audit: AuditInfo::created_by(actor),
        })
    }

    /// データベースから取得したデータで菜品を再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: DishId,
        name: String,
        category_id: CategoryId,
        price: Money,
        image: String,
        description: String,
        status: Status,
        flavors: Vec<DishFlavor>,
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
            flavors,
            audit,
        }
    }

    pub fn id(&self) -> DishId {
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

    pub fn flavors(&self) -> &[DishFlavor] {
        &self.flavors
    }

    pub fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    pub fn is_on_sale(&self) -> bool {
        self.status.is_enabled()
    }

    /// 属性と味付けオプションをまとめて置き換える
    pub fn update(&mut self, draft: DishDraft, actor: Option<EmployeeId>) -> Result<(), DomainError> {
        draft.validate()?;
        self.name = draft.name;
        self.category_id = draft.category_id;
        self.price = draft.price;
        self.image = draft.image;
        self.description = draft.description;
        self.flavors = draft.flavors;
        self.audit.touch(actor);
        Ok(())
    }

    /// 販売開始・停止
    pub fn change_status(&mut self, status: Status, actor: Option<EmployeeId>) {
        self.status = status;
        self.audit.touch(actor);
    }

    /// 削除可能か検証
    /// 販売中の菜品は削除できない
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.is_on_sale() {
            return Err(DomainError::DeletionNotAllowed(format!(
                "販売中の菜品は削除できません: {}",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, flavors: Vec<DishFlavor>) -> DishDraft {
        DishDraft {
            name: name.to_string(),
            category_id: CategoryId::new(),
            price: Money::cny(2800),
            image: "kung-pao.png".to_string(),
            description: "定番".to_string(),
            flavors,
        }
    }

    #[test]
    fn test_new_dish_keeps_flavors() {
        let flavor = DishFlavor::new("辛さ".to_string(), "[\"激辛\",\"中辛\"]".to_string()).unwrap();
        let dish = Dish::new(DishId::new(), draft("宮保鶏丁", vec![flavor.clone()]), Status::Enabled, None)
            .unwrap();
        assert_eq!(dish.flavors(), &[flavor]);
        assert!(dish.is_on_sale());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let result = Dish::new(DishId::new(), draft("  ", vec![]), Status::Enabled, None);
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(DishFlavor::new("".to_string(), "[]".to_string()).is_err());
    }

    #[test]
    fn test_fields_longer_than_columns_are_rejected() {
        // 32文字ちょうどは通る（マルチバイトでも文字数で数える）
        let name = "麻".repeat(Dish::MAX_NAME_LEN);
        assert!(Dish::new(DishId::new(), draft(&name, vec![]), Status::Enabled, None).is_ok());

        let name = "麻".repeat(Dish::MAX_NAME_LEN + 1);
        let result = Dish::new(DishId::new(), draft(&name, vec![]), Status::Enabled, None);
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let mut long_image = draft("麻婆豆腐", vec![]);
        long_image.image = "a".repeat(256);
        assert!(Dish::new(DishId::new(), long_image, Status::Enabled, None).is_err());

        assert!(DishFlavor::new("辛".repeat(33), "[]".to_string()).is_err());
        assert!(DishFlavor::new("辛さ".to_string(), "x".repeat(256)).is_err());
    }

    #[test]
    fn test_on_sale_dish_is_not_deletable() {
        let mut dish = Dish::new(DishId::new(), draft("麻婆豆腐", vec![]), Status::Enabled, None).unwrap();
        assert!(matches!(
            dish.ensure_deletable(),
            Err(DomainError::DeletionNotAllowed(_))
        ));

        dish.change_status(Status::Disabled, None);
        assert!(dish.ensure_deletable().is_ok());
    }

    #[test]
    fn test_update_replaces_flavors() {
        let old = DishFlavor::new("温度".to_string(), "[\"熱\"]".to_string()).unwrap();
        let new = DishFlavor::new("甘さ".to_string(), "[\"少なめ\"]".to_string()).unwrap();
        let mut dish = Dish::new(DishId::new(), draft("酸辣湯", vec![old]), Status::Disabled, None).unwrap();

        dish.update(draft("酸辣湯", vec![new.clone()]), None).unwrap();

        assert_eq!(dish.flavors(), &[new]);
    }
}
