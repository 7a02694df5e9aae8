use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::adapter::driven::dish_repository::{push_in_list, push_menu_filters};
use crate::adapter::driven::employee_repository::{audit_from_row, status_from_row};
use crate::domain::model::{
    CategoryId, DishId, Money, Page, PageRequest, Setmeal, SetmealDish, SetmealId,
};
use crate::domain::port::{MenuQuery, RepositoryError, SetmealRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, QueryBuilder, Row};
use std::collections::HashMap;

const SETMEAL_COLUMNS: &str = "id, name, category_id, price, image, description, status, \
     create_time, update_time, create_user, update_user";

/// MySQLセットメニューリポジトリ
/// セットメニュー（setmeal）と菜品の関連（setmeal_dish）を扱う
pub struct MySqlSetmealRepository {
    pool: Pool<MySql>,
}

impl MySqlSetmealRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn load_dishes(
        &self,
        ids: &[SetmealId],
    ) -> Result<HashMap<SetmealId, Vec<SetmealDish>>, RepositoryError> {
        let mut links: HashMap<SetmealId, Vec<SetmealDish>> = HashMap::new();
        if ids.is_empty() {
            return Ok(links);
        }

        let mut builder = QueryBuilder::<MySql>::new(
            "SELECT setmeal_id, dish_id, name, price, copies FROM setmeal_dish WHERE setmeal_id",
        );
        push_in_list(&mut builder, ids.iter().map(|id| id.to_string()));
        builder.push(" ORDER BY id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("セットメニューの菜品取得に失敗しました"))?;

        for row in rows {
            let (setmeal_id, link) = setmeal_dish_from_row(&row)?;
            links.entry(setmeal_id).or_default().push(link);
        }
        Ok(links)
    }

    async fn build_setmeals(&self, rows: Vec<MySqlRow>) -> Result<Vec<Setmeal>, RepositoryError> {
        let ids = rows
            .iter()
            .map(|row| {
                let raw: String = row
                    .try_get("id")
                    .map_err(fetch_failed("セットメニューの取得に失敗しました"))?;
                SetmealId::from_string(&raw)
                    .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut links = self.load_dishes(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| setmeal_from_row(row, id, links.remove(&id).unwrap_or_default()))
            .collect()
    }
}

fn setmeal_dish_from_row(row: &MySqlRow) -> Result<(SetmealId, SetmealDish), RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("セットメニューの菜品取得に失敗しました"))
    };

    let setmeal_id = SetmealId::from_string(&text("setmeal_id")?)
        .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))?;
    let dish_id =
        DishId::from_string(&text("dish_id")?).map_err(fetch_failed("菜品IDの解析に失敗しました"))?;
    let price: i64 = row
        .try_get("price")
        .map_err(fetch_failed("価格の取得に失敗しました"))?;
    let copies: i32 = row
        .try_get("copies")
        .map_err(fetch_failed("個数の取得に失敗しました"))?;
    let copies = u32::try_from(copies).map_err(fetch_failed("個数の解析に失敗しました"))?;

    let link = SetmealDish::new(
        dish_id,
        text("name")?,
        Money::new(price).map_err(fetch_failed("価格の構築に失敗しました"))?,
        copies,
    )
    .map_err(fetch_failed("セットメニューの菜品の構築に失敗しました"))?;
    Ok((setmeal_id, link))
}

fn setmeal_from_row(
    row: &MySqlRow,
    id: SetmealId,
    dishes: Vec<SetmealDish>,
) -> Result<Setmeal, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("セットメニューの取得に失敗しました"))
    };

    let category_id = CategoryId::from_string(&text("category_id")?)
        .map_err(fetch_failed("カテゴリIDの解析に失敗しました"))?;
    let price: i64 = row
        .try_get("price")
        .map_err(fetch_failed("価格の取得に失敗しました"))?;

    Ok(Setmeal::reconstruct(
        id,
        text("name")?,
        category_id,
        Money::new(price).map_err(fetch_failed("価格の構築に失敗しました"))?,
        text("image")?,
        text("description")?,
        status_from_row(row)?,
        dishes,
        audit_from_row(row)?,
    ))
}

#[async_trait]
impl SetmealRepository for MySqlSetmealRepository {
    async fn save(&self, setmeal: &Setmeal) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        let id = setmeal.id().to_string();
        let audit = setmeal.audit();

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM setmeal WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの確認に失敗しました"))?;

        let query = if exists > 0 {
            sqlx::query(
                r#"
                UPDATE setmeal
                SET name = ?, category_id = ?, price = ?, image = ?, description = ?,
                    status = ?, update_time = ?, update_user = ?
                WHERE id = ?
                "#,
            )
            .bind(setmeal.name())
            .bind(setmeal.category_id().to_string())
            .bind(setmeal.price().amount())
            .bind(setmeal.image())
            .bind(setmeal.description())
            .bind(setmeal.status().code())
            .bind(audit.update_time())
            .bind(audit.update_user().map(|u| u.to_string()))
            .bind(&id)
        } else {
            sqlx::query(
                r#"
                INSERT INTO setmeal
                    (id, name, category_id, price, image, description, status,
                     create_time, update_time, create_user, update_user)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(setmeal.name())
            .bind(setmeal.category_id().to_string())
            .bind(setmeal.price().amount())
            .bind(setmeal.image())
            .bind(setmeal.description())
            .bind(setmeal.status().code())
            .bind(audit.create_time())
            .bind(audit.update_time())
            .bind(audit.create_user().map(|u| u.to_string()))
            .bind(audit.update_user().map(|u| u.to_string()))
        };
        query
            .execute(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの保存に失敗しました"))?;

        // 菜品の関連は全削除してから再登録
        sqlx::query("DELETE FROM setmeal_dish WHERE setmeal_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの菜品削除に失敗しました"))?;

        for link in setmeal.dishes() {
            sqlx::query(
                "INSERT INTO setmeal_dish (setmeal_id, dish_id, name, price, copies) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(link.dish_id().to_string())
            .bind(link.name())
            .bind(link.price().amount())
            .bind(link.copies())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの菜品保存に失敗しました"))?;
        }

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: SetmealId) -> Result<Option<Setmeal>, RepositoryError> {
        Ok(self.find_by_ids(&[id]).await?.into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[SetmealId]) -> Result<Vec<Setmeal>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM setmeal WHERE id", SETMEAL_COLUMNS));
        push_in_list(&mut builder, ids.iter().map(|id| id.to_string()));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("セットメニューの取得に失敗しました"))?;
        self.build_setmeals(rows).await
    }

    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Setmeal>, RepositoryError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM setmeal");
        push_menu_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("セットメニューの件数取得に失敗しました"))?;

        let mut select =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM setmeal", SETMEAL_COLUMNS));
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
            .map_err(query_failed("セットメニューの検索に失敗しました"))?;
        let records = self.build_setmeals(rows).await?;

        Ok(Page::new(total.max(0) as u64, records))
    }

    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Setmeal>, RepositoryError> {
        let mut select =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM setmeal", SETMEAL_COLUMNS));
        push_menu_filters(&mut select, query);
        select.push(" ORDER BY create_time DESC");

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("セットメニューの検索に失敗しました"))?;
        self.build_setmeals(rows).await
    }

    async fn find_ids_by_dish_ids(
        &self,
        dish_ids: &[DishId],
    ) -> Result<Vec<SetmealId>, RepositoryError> {
        if dish_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<MySql>::new("SELECT DISTINCT setmeal_id FROM setmeal_dish WHERE dish_id");
        push_in_list(&mut builder, dish_ids.iter().map(|id| id.to_string()));

        let raw_ids: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("セットメニューの参照確認に失敗しました"))?;

        raw_ids
            .iter()
            .map(|raw| {
                SetmealId::from_string(raw)
                    .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))
            })
            .collect()
    }

    async fn delete_by_ids(&self, ids: &[SetmealId]) -> Result<bool, RepositoryError> {
        if ids.is_empty() {
            return Ok(true);
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        // 販売停止中のものだけを消す
        let mut setmeals = QueryBuilder::<MySql>::new("DELETE FROM setmeal WHERE id");
        push_in_list(&mut setmeals, ids.iter().map(|id| id.to_string()));
        setmeals.push(" AND status = 0");
        let deleted = setmeals
            .build()
            .execute(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの削除に失敗しました"))?
            .rows_affected();
        if deleted != ids.len() as u64 {
            tx.rollback()
                .await
                .map_err(query_failed("トランザクションのロールバックに失敗しました"))?;
            return Ok(false);
        }

        let mut links = QueryBuilder::<MySql>::new("DELETE FROM setmeal_dish WHERE setmeal_id");
        push_in_list(&mut links, ids.iter().map(|id| id.to_string()));
        links
            .build()
            .execute(&mut *tx)
            .await
            .map_err(query_failed("セットメニューの菜品削除に失敗しました"))?;

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(true)
    }
}
