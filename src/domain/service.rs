// ドメインサービス
// 複数の集約にまたがるビジネスルールを実装

use crate::domain::error::DomainError;
use crate::domain::model::{Dish, DishId, SetmealId};

/// メニュー管理ルール
/// 菜品とセットメニューの関係に関するルールを担当
pub struct MenuRules;

impl MenuRules {
    /// 菜品が一括削除できるか検証する
    ///
    /// # Arguments
    /// * `dishes` - 削除対象の菜品
    /// * `referencing_setmeals` - 削除対象の菜品を含むセットメニューのID
    ///
    /// # Returns
    /// * `Ok(())` - 削除可能
    /// * `Err(DomainError::DeletionNotAllowed)` - 販売中の菜品がある、またはセットメニューに含まれている
    pub fn ensure_dishes_deletable(
        dishes: &[Dish],
        referencing_setmeals: &[SetmealId],
    ) -> Result<(), DomainError> {
        // 販売中の判定を先に行う
        for dish in dishes {
            dish.ensure_deletable()?;
        }

        if !referencing_setmeals.is_empty() {
            return Err(DomainError::DeletionNotAllowed(
                "セットメニューに含まれている菜品は削除できません".to_string(),
            ));
        }

        Ok(())
    }

    /// セットメニューを販売開始できるか検証する
    ///
    /// # Arguments
    /// * `dish_ids` - セットメニューに含まれる菜品のID
    /// * `dishes` - 含まれる菜品の現在の状態
    pub fn ensure_setmeal_can_enable(dish_ids: &[DishId], dishes: &[Dish]) -> Result<(), DomainError> {
        for dish_id in dish_ids {
            let on_sale = dishes
                .iter()
                .find(|d| d.id() == *dish_id)
                .map(Dish::is_on_sale)
                .unwrap_or(false);

            if !on_sale {
                return Err(DomainError::SetmealEnableFailed(
                    "販売停止中の菜品を含むセットメニューは販売開始できません".to_string(),
                ));
            }
        }

        Ok(())
    }
}
