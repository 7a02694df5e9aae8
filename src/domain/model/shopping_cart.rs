use crate::domain::error::DomainError;
use crate::domain::model::{CartItemId, DishId, Money, SetmealId, UserId};
use chrono::{DateTime, Utc};

/// カートに入れる商品
/// 菜品（味付け付き）かセットメニューのどちらか一方
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartProduct {
    Dish {
        dish_id: DishId,
        flavor: Option<String>,
    },
    Setmeal {
        setmeal_id: SetmealId,
    },
}

impl CartProduct {
    pub const MAX_FLAVOR_LEN: usize = 50;

    /// リクエストの値から商品を決定
    /// 菜品IDとセットメニューIDはちょうど一方だけ指定されている必要がある
    pub fn from_parts(
        dish_id: Option<DishId>,
        setmeal_id: Option<SetmealId>,
        flavor: Option<String>,
    ) -> Result<Self, DomainError> {
        let flavor = flavor.filter(|f| !f.trim().is_empty());
        if flavor.as_ref().is_some_and(|f| f.chars().count() > Self::MAX_FLAVOR_LEN) {
            return Err(DomainError::Validation(format!(
                "味付けは{}文字以内で指定してください",
                Self::MAX_FLAVOR_LEN
            )));
        }
        match (dish_id, setmeal_id) {
            (Some(dish_id), None) => Ok(CartProduct::Dish { dish_id, flavor }),
            (None, Some(setmeal_id)) => Ok(CartProduct::Setmeal { setmeal_id }),
            _ => Err(DomainError::Validation(
                "菜品IDかセットメニューIDのどちらか一方を指定してください".to_string(),
            )),
        }
    }

    pub fn dish_id(&self) -> Option<DishId> {
        match self {
            CartProduct::Dish { dish_id, .. } => Some(*dish_id),
            CartProduct::Setmeal { .. } => None,
        }
    }

    pub fn setmeal_id(&self) -> Option<SetmealId> {
        match self {
            CartProduct::Setmeal { setmeal_id } => Some(*setmeal_id),
            CartProduct::Dish { .. } => None,
        }
    }

    pub fn flavor(&self) -> Option<&str> {
        match self {
            CartProduct::Dish { flavor, .. } => flavor.as_deref(),
            CartProduct::Setmeal { .. } => None,
        }
    }
}

/// カート明細
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    id: CartItemId,
    user_id: UserId,
    product: CartProduct,
    name: String,
    image: String,
    amount: Money,
    number: u32,
    created_at: DateTime<Utc>,
}

impl CartItem {
    /// 新しいカート明細を作成（数量1）
    pub fn new(
        id: CartItemId,
        user_id: UserId,
        product: CartProduct,
        name: String,
        image: String,
        amount: Money,
    ) -> Self {
        Self {
            id,
            user_id,
            product,
            name,
            image,
            amount,
            number: 1,
            created_at: Utc::now(),
        }
    }

    /// データベースから取得したデータで再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: CartItemId,
        user_id: UserId,
        product: CartProduct,
        name: String,
        image: String,
        amount: Money,
        number: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if number == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id,
            user_id,
            product,
            name,
            image,
            amount,
            number,
            created_at,
        })
    }

    pub fn id(&self) -> CartItemId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn product(&self) -> &CartProduct {
        &self.product
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// 単価
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 小計を計算（単価 × 数量）
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.amount.multiply(self.number)
    }

    /// 数量を1増やす
    pub fn increase(&mut self) -> Result<(), DomainError> {
        self.increase_by(1)
    }

    /// 数量をまとめて増やす
    pub fn increase_by(&mut self, count: u32) -> Result<(), DomainError> {
        self.number = self
            .number
            .checked_add(count)
            .ok_or(DomainError::InvalidQuantity)?;
        Ok(())
    }

    /// 数量を1減らす
    /// 残りの数量を返す。0になった明細は呼び出し側で削除する
    pub fn decrease(&mut self) -> u32 {
        self.number = self.number.saturating_sub(1);
        self.number
    }
}

/// 顧客のショッピングカート
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShoppingCart {
    items: Vec<CartItem>,
}

impl ShoppingCart {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 同じ商品の明細を探す
    pub fn find(&self, product: &CartProduct) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product() == product)
    }

    /// 合計金額を計算
    pub fn total(&self) -> Result<Money, DomainError> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.add(&item.subtotal()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish_item(amount: i64, flavor: Option<&str>) -> CartItem {
        CartItem::new(
            CartItemId::new(),
            UserId::new(),
            CartProduct::Dish {
                dish_id: DishId::new(),
                flavor: flavor.map(str::to_string),
            },
            "魚香肉絲".to_string(),
            String::new(),
            Money::cny(amount),
        )
    }

    #[test]
    fn test_cart_product_requires_exactly_one_target() {
        assert!(CartProduct::from_parts(None, None, None).is_err());
        assert!(CartProduct::from_parts(Some(DishId::new()), Some(SetmealId::new()), None).is_err());

        let product =
            CartProduct::from_parts(None, Some(SetmealId::new()), Some("辛口".to_string())).unwrap();
        assert_eq!(product.flavor(), None);
    }

    #[test]
    fn test_blank_flavor_is_ignored() {
        let dish_id = DishId::new();
        let product = CartProduct::from_parts(Some(dish_id), None, Some(" ".to_string())).unwrap();
        assert_eq!(product, CartProduct::Dish { dish_id, flavor: None });
    }

    #[test]
    fn test_increase_and_decrease() {
        let mut item = dish_item(1000, None);
        item.increase().unwrap();
        item.increase().unwrap();
        assert_eq!(item.number(), 3);
        assert_eq!(item.subtotal().unwrap().amount(), 3000);
        assert_eq!(item.decrease(), 2);
    }

    #[test]
    fn test_reconstruct_rejects_zero_number() {
        let result = CartItem::reconstruct(
            CartItemId::new(),
            UserId::new(),
            CartProduct::Setmeal { setmeal_id: SetmealId::new() },
            "セット".to_string(),
            String::new(),
            Money::cny(100),
            0,
            Utc::now(),
        );
        assert_eq!(result, Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_cart_total_and_find() {
        let mut first = dish_item(1500, Some("微辣"));
        first.increase().unwrap();
        let second = dish_item(800, None);
        let product = second.product().clone();
        let cart = ShoppingCart::new(vec![first, second]);

        assert_eq!(cart.total().unwrap().amount(), 3800);
        assert!(cart.find(&product).is_some());
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_total_overflow_is_reported() {
        let mut expensive = dish_item(i64::MAX / 2, None);
        expensive.increase().unwrap();
        let cart = ShoppingCart::new(vec![expensive, dish_item(2, None)]);

        assert_eq!(cart.total(), Err(DomainError::AmountOverflow));
    }

    #[test]
    fn test_increase_by_merges_quantities() {
        let mut item = dish_item(500, None);
        item.increase_by(4).unwrap();
        assert_eq!(item.number(), 5);
        assert_eq!(item.increase_by(u32::MAX), Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_long_flavor_is_rejected() {
        let flavor = "辛".repeat(CartProduct::MAX_FLAVOR_LEN + 1);
        let result = CartProduct::from_parts(Some(DishId::new()), None, Some(flavor));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
