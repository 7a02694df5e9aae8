use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::domain::model::{
    CartItem, CartItemId, CartProduct, DishId, Money, SetmealId, ShoppingCart, UserId,
};
use crate::domain::port::{RepositoryError, ShoppingCartRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQLショッピングカートリポジトリ
pub struct MySqlShoppingCartRepository {
    pool: Pool<MySql>,
}

impl MySqlShoppingCartRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn cart_item_from_row(row: &MySqlRow) -> Result<CartItem, RepositoryError> {
    let get_text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("カート明細の取得に失敗しました"))
    };
    let get_optional = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("カート明細の取得に失敗しました"))
    };

    let id = CartItemId::from_string(&get_text("id")?)
        .map_err(fetch_failed("カート明細IDの解析に失敗しました"))?;
    let user_id = UserId::from_string(&get_text("user_id")?)
        .map_err(fetch_failed("顧客IDの解析に失敗しました"))?;
    let dish_id = get_optional("dish_id")?
        .map(|raw| DishId::from_string(&raw))
        .transpose()
        .map_err(fetch_failed("菜品IDの解析に失敗しました"))?;
    let setmeal_id = get_optional("setmeal_id")?
        .map(|raw| SetmealId::from_string(&raw))
        .transpose()
        .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))?;
    let product = CartProduct::from_parts(dish_id, setmeal_id, get_optional("dish_flavor")?)
        .map_err(fetch_failed("カート商品の構築に失敗しました"))?;

    let amount: i64 = row
        .try_get("amount")
        .map_err(fetch_failed("金額の取得に失敗しました"))?;
    let number: i32 = row
        .try_get("number")
        .map_err(fetch_failed("数量の取得に失敗しました"))?;

    CartItem::reconstruct(
        id,
        user_id,
        product,
        get_text("name")?,
        get_text("image")?,
        Money::new(amount).map_err(fetch_failed("金額の構築に失敗しました"))?,
        u32::try_from(number).map_err(fetch_failed("数量の解析に失敗しました"))?,
        row.try_get("create_time")
            .map_err(fetch_failed("追加日時の取得に失敗しました"))?,
    )
    .map_err(fetch_failed("カート明細の構築に失敗しました"))
}

#[async_trait]
impl ShoppingCartRepository for MySqlShoppingCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<ShoppingCart, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, image, dish_id, setmeal_id, dish_flavor, number, amount, create_time
            FROM shopping_cart
            WHERE user_id = ?
            ORDER BY create_time
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("カートの取得に失敗しました"))?;

        let items = rows
            .iter()
            .map(cart_item_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ShoppingCart::new(items))
    }

    async fn save(&self, item: &CartItem) -> Result<(), RepositoryError> {
        let product = item.product();
        sqlx::query(
            r#"
            INSERT INTO shopping_cart
                (id, user_id, name, image, dish_id, setmeal_id, dish_flavor, number, amount, create_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE number = VALUES(number)
            "#,
        )
        .bind(item.id().to_string())
        .bind(item.user_id().to_string())
        .bind(item.name())
        .bind(item.image())
        .bind(product.dish_id().map(|id| id.to_string()))
        .bind(product.setmeal_id().map(|id| id.to_string()))
        .bind(product.flavor())
        .bind(item.number())
        .bind(item.amount().amount())
        .bind(item.created_at())
        .execute(&self.pool)
        .await
        .map_err(query_failed("カート明細の保存に失敗しました"))?;
        Ok(())
    }

    async fn delete(&self, id: CartItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shopping_cart WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("カート明細の削除に失敗しました"))?;
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shopping_cart WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("カートのクリアに失敗しました"))?;
        Ok(())
    }
}
