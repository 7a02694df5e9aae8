use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{CartItem, CartProduct, ShoppingCart, UserId};
use crate::domain::port::{DishRepository, SetmealRepository, ShoppingCartRepository};
use std::sync::Arc;

/// ショッピングカートアプリケーションサービス
pub struct ShoppingCartApplicationService {
    shopping_cart_repository: Arc<dyn ShoppingCartRepository>,
    dish_repository: Arc<dyn DishRepository>,
    setmeal_repository: Arc<dyn SetmealRepository>,
}

impl ShoppingCartApplicationService {
    pub fn new(
        shopping_cart_repository: Arc<dyn ShoppingCartRepository>,
        dish_repository: Arc<dyn DishRepository>,
        setmeal_repository: Arc<dyn SetmealRepository>,
    ) -> Self {
        Self {
            shopping_cart_repository,
            dish_repository,
            setmeal_repository,
        }
    }

    /// 商品をカートに追加
    /// 同じ商品（同じ菜品と味付け、または同じセットメニュー）があれば数量を1増やす
    /// なければ現在の価格で新しい明細を作る。販売停止中の商品は追加できない
    pub async fn add(&self, user_id: UserId, product: CartProduct) -> Result<(), ApplicationError> {
        let (name, image, amount) = match &product {
            CartProduct::Dish { dish_id, .. } => {
                let dish = self
                    .dish_repository
                    .find_by_id(*dish_id)
                    .await?
                    .ok_or_else(|| {
                        ApplicationError::NotFound(format!("菜品が見つかりません: {}", dish_id))
                    })?;
                if !dish.is_on_sale() {
                    return Err(DomainError::NotOnSale(format!(
                        "販売停止中の菜品です: {}",
                        dish.name()
                    ))
                    .into());
                }
                (dish.name().to_string(), dish.image().to_string(), dish.price())
            }
            CartProduct::Setmeal { setmeal_id } => {
                let setmeal = self
                    .setmeal_repository
                    .find_by_id(*setmeal_id)
                    .await?
                    .ok_or_else(|| {
                        ApplicationError::NotFound(format!(
                            "セットメニューが見つかりません: {}",
                            setmeal_id
                        ))
                    })?;
                if !setmeal.is_on_sale() {
                    return Err(DomainError::NotOnSale(format!(
                        "販売停止中のセットメニューです: {}",
                        setmeal.name()
                    ))
                    .into());
                }
                (
                    setmeal.name().to_string(),
                    setmeal.image().to_string(),
                    setmeal.price(),
                )
            }
        };

        let cart = self.shopping_cart_repository.find_by_user(user_id).await?;
        if let Some(existing) = cart.find(&product) {
            let mut item = existing.clone();
            item.increase()?;
            self.shopping_cart_repository.save(&item).await?;
            return Ok(());
        }

        let item = CartItem::new(
            self.shopping_cart_repository.next_identity(),
            user_id,
            product,
            name,
            image,
            amount,
        );
        self.shopping_cart_repository.save(&item).await?;
        Ok(())
    }

    /// 商品の数量を1減らす
    /// 数量が0になった明細は削除する
    pub async fn sub(&self, user_id: UserId, product: CartProduct) -> Result<(), ApplicationError> {
        let cart = self.shopping_cart_repository.find_by_user(user_id).await?;
        let mut item = cart
            .find(&product)
            .cloned()
            .ok_or_else(|| ApplicationError::NotFound("カートに商品がありません".to_string()))?;

        if item.decrease() == 0 {
            self.shopping_cart_repository.delete(item.id()).await?;
        } else {
            self.shopping_cart_repository.save(&item).await?;
        }
        Ok(())
    }

    /// カートの内容
    pub async fn list(&self, user_id: UserId) -> Result<ShoppingCart, ApplicationError> {
        self.shopping_cart_repository
            .find_by_user(user_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// カートを空にする
    pub async fn clean(&self, user_id: UserId) -> Result<(), ApplicationError> {
        self.shopping_cart_repository
            .clear(user_id)
            .await
            .map_err(ApplicationError::from)
    }
}
