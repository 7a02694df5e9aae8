use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::adapter::driven::employee_repository::{audit_from_row, status_from_row};
use crate::domain::model::{
    CategoryId, Dish, DishFlavor, DishId, EmployeeId, Money, Page, PageRequest, SetmealId,
};
use crate::domain::port::{DishRepository, MenuQuery, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use chrono::Utc;
use sqlx::{MySql, Pool, QueryBuilder, Row, Transaction};
use std::collections::HashMap;

const DISH_COLUMNS: &str = "id, name, category_id, price, image, description, status, \
     create_time, update_time, create_user, update_user";

/// 菜品・セットメニュー共通の検索条件を組み立てる
pub(super) fn push_menu_filters(builder: &mut QueryBuilder<'_, MySql>, query: &MenuQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        builder.push(" AND name LIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(category_id) = query.category_id {
        builder
            .push(" AND category_id = ")
            .push_bind(category_id.to_string());
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.code());
    }
}

/// `IN (?, ?, ...)` を組み立てる
pub(super) fn push_in_list<I>(builder: &mut QueryBuilder<'_, MySql>, values: I)
where
    I: IntoIterator<Item = String>,
{
    builder.push(" IN (");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value);
    }
    separated.push_unseparated(")");
}

/// MySQL菜品リポジトリ
/// 菜品（dish）と味付けオプション（dish_flavor）を扱う
pub struct MySqlDishRepository {
    pool: Pool<MySql>,
}

impl MySqlDishRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 菜品IDごとに味付けオプションを読み込む
    async fn load_flavors(
        &self,
        ids: &[DishId],
    ) -> Result<HashMap<DishId, Vec<DishFlavor>>, RepositoryError> {
        let mut flavors: HashMap<DishId, Vec<DishFlavor>> = HashMap::new();
        if ids.is_empty() {
            return Ok(flavors);
        }

        let mut builder =
            QueryBuilder::<MySql>::new("SELECT dish_id, name, value FROM dish_flavor WHERE dish_id");
        push_in_list(&mut builder, ids.iter().map(|id| id.to_string()));
        builder.push(" ORDER BY id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("味付けオプションの取得に失敗しました"))?;

        for row in rows {
            let dish_id: String = row
                .try_get("dish_id")
                .map_err(fetch_failed("味付けオプションの取得に失敗しました"))?;
            let dish_id =
                DishId::from_string(&dish_id).map_err(fetch_failed("菜品IDの解析に失敗しました"))?;
            let flavor = DishFlavor::new(
                row.try_get("name")
                    .map_err(fetch_failed("味付けオプションの取得に失敗しました"))?,
                row.try_get("value")
                    .map_err(fetch_failed("味付けオプションの取得に失敗しました"))?,
            )
            .map_err(fetch_failed("味付けオプションの構築に失敗しました"))?;
            flavors.entry(dish_id).or_default().push(flavor);
        }
        Ok(flavors)
    }

    /// 行から菜品を組み立てる（味付けオプションはまとめて読み込む）
    async fn build_dishes(&self, rows: Vec<MySqlRow>) -> Result<Vec<Dish>, RepositoryError> {
        let ids = rows
            .iter()
            .map(|row| {
                let raw: String = row
                    .try_get("id")
                    .map_err(fetch_failed("菜品の取得に失敗しました"))?;
                DishId::from_string(&raw).map_err(fetch_failed("菜品IDの解析に失敗しました"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut flavors = self.load_flavors(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| dish_from_row(row, id, flavors.remove(&id).unwrap_or_default()))
            .collect()
    }
}

fn dish_from_row(row: &MySqlRow, id: DishId, flavors: Vec<DishFlavor>) -> Result<Dish, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("菜品の取得に失敗しました"))
    };

    let category_id = CategoryId::from_string(&text("category_id")?)
        .map_err(fetch_failed("カテゴリIDの解析に失敗しました"))?;
    let price: i64 = row
        .try_get("price")
        .map_err(fetch_failed("価格の取得に失敗しました"))?;
    let price = Money::new(price).map_err(fetch_failed("価格の構築に失敗しました"))?;

    Ok(Dish::reconstruct(
        id,
        text("name")?,
        category_id,
        price,
        text("image")?,
        text("description")?,
        status_from_row(row)?,
        flavors,
        audit_from_row(row)?,
    ))
}

/// 菜品本体を登録または更新し、味付けオプションを全削除してから再登録する
async fn write_dish(tx: &mut Transaction<'_, MySql>, dish: &Dish) -> Result<(), RepositoryError> {
    let id = dish.id().to_string();
    let audit = dish.audit();

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dish WHERE id = ?")
        .bind(&id)
        .fetch_one(&mut **tx)
        .await
        .map_err(query_failed("菜品の確認に失敗しました"))?;

    let query = if exists > 0 {
        sqlx::query(
            r#"
            UPDATE dish
            SET name = ?, category_id = ?, price = ?, image = ?, description = ?,
                status = ?, update_time = ?, update_user = ?
            WHERE id = ?
            "#,
        )
        .bind(dish.name())
        .bind(dish.category_id().to_string())
        .bind(dish.price().amount())
        .bind(dish.image())
        .bind(dish.description())
        .bind(dish.status().code())
        .bind(audit.update_time())
        .bind(audit.update_user().map(|u| u.to_string()))
        .bind(&id)
    } else {
        sqlx::query(
            r#"
            INSERT INTO dish
                (id, name, category_id, price, image, description, status,
                 create_time, update_time, create_user, update_user)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(dish.name())
        .bind(dish.category_id().to_string())
        .bind(dish.price().amount())
        .bind(dish.image())
        .bind(dish.description())
        .bind(dish.status().code())
        .bind(audit.create_time())
        .bind(audit.update_time())
        .bind(audit.create_user().map(|u| u.to_string()))
        .bind(audit.update_user().map(|u| u.to_string()))
    };
    query
        .execute(&mut **tx)
        .await
        .map_err(query_failed("菜品の保存に失敗しました"))?;

    // 味付けオプションは全削除してから再登録
    sqlx::query("DELETE FROM dish_flavor WHERE dish_id = ?")
        .bind(&id)
        .execute(&mut **tx)
        .await
        .map_err(query_failed("味付けオプションの削除に失敗しました"))?;

    for flavor in dish.flavors() {
        sqlx::query("INSERT INTO dish_flavor (dish_id, name, value) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(flavor.name())
            .bind(flavor.value())
            .execute(&mut **tx)
            .await
            .map_err(query_failed("味付けオプションの保存に失敗しました"))?;
    }

    Ok(())
}

#[async_trait]
impl DishRepository for MySqlDishRepository {
    async fn save(&self, dish: &Dish) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        write_dish(&mut tx, dish).await?;

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: DishId) -> Result<Option<Dish>, RepositoryError> {
        Ok(self.find_by_ids(&[id]).await?.into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[DishId]) -> Result<Vec<Dish>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM dish WHERE id", DISH_COLUMNS));
        push_in_list(&mut builder, ids.iter().map(|id| id.to_string()));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("菜品の取得に失敗しました"))?;
        self.build_dishes(rows).await
    }

    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Dish>, RepositoryError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM dish");
        push_menu_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("菜品の件数取得に失敗しました"))?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM dish", DISH_COLUMNS));
        push_menu_filters(&mut select, query);
        select
            .push(" ORDER BY create_time DESC LIMIT ")
            .push_bind(page.page_size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("菜品の検索に失敗しました"))?;
        let records = self.build_dishes(rows).await?;

        Ok(Page::new(total.max(0) as u64, records))
    }

    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Dish>, RepositoryError> {
        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM dish", DISH_COLUMNS));
        push_menu_filters(&mut select, query);
        select.push(" ORDER BY create_time DESC");

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("菜品の検索に失敗しました"))?;
        self.build_dishes(rows).await
    }

    async fn delete_by_ids(&self, ids: &[DishId]) -> Result<bool, RepositoryError> {
        if ids.is_empty() {
            return Ok(true);
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        // 販売停止中でセットメニューに含まれない菜品だけを消す
        let mut dishes = QueryBuilder::<MySql>::new("DELETE FROM dish WHERE id");
        push_in_list(&mut dishes, ids.iter().map(|id| id.to_string()));
        dishes.push(
            " AND status = 0 AND NOT EXISTS \
             (SELECT 1 FROM setmeal_dish sd WHERE sd.dish_id = dish.id)",
        );
        let deleted = dishes
            .build()
            .execute(&mut *tx)
            .await
            .map_err(query_failed("菜品の削除に失敗しました"))?
            .rows_affected();
        if deleted != ids.len() as u64 {
            tx.rollback()
                .await
                .map_err(query_failed("トランザクションのロールバックに失敗しました"))?;
            return Ok(false);
        }

        let mut flavors = QueryBuilder::<MySql>::new("DELETE FROM dish_flavor WHERE dish_id");
        push_in_list(&mut flavors, ids.iter().map(|id| id.to_string()));
        flavors
            .build()
            .execute(&mut *tx)
            .await
            .map_err(query_failed("味付けオプションの削除に失敗しました"))?;

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(true)
    }

    async fn stop_sale(
        &self,
        dish: &Dish,
        actor: Option<EmployeeId>,
    ) -> Result<Vec<SetmealId>, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        write_dish(&mut tx, dish).await?;

        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT s.id FROM setmeal s
            JOIN setmeal_dish sd ON sd.setmeal_id = s.id
            WHERE sd.dish_id = ? AND s.status = 1
            FOR UPDATE
            "#,
        )
        .bind(dish.id().to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_failed("セットメニューの取得に失敗しました"))?;
        let setmeal_ids = rows
            .iter()
            .map(|raw| SetmealId::from_string(raw))
            .collect::<Result<Vec<_>, _>>()
            .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))?;

        if !setmeal_ids.is_empty() {
            let mut stop = QueryBuilder::<MySql>::new("UPDATE setmeal SET status = 0, update_time = ");
            stop.push_bind(Utc::now())
                .push(", update_user = ")
                .push_bind(actor.map(|a| a.to_string()))
                .push(" WHERE id");
            push_in_list(&mut stop, setmeal_ids.iter().map(|id| id.to_string()));
            stop.build()
                .execute(&mut *tx)
                .await
                .map_err(query_failed("セットメニューの販売停止に失敗しました"))?;
        }

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(setmeal_ids)
    }
}
