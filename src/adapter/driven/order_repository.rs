use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::adapter::driven::dish_repository::push_in_list;
use crate::domain::model::{
    AddressBookId, DishId, Money, Order, OrderDetail, OrderId, OrderRecord, OrderStatus, Page,
    PageRequest, PayMethod, PayStatus, SetmealId, UserId,
};
use crate::domain::port::{OrderQuery, OrderRepository, RepositoryError, SalesRank};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, QueryBuilder, Row, Transaction};
use std::collections::HashMap;

const ORDER_COLUMNS: &str = "id, number, status, user_id, address_book_id, consignee, phone, \
     address, order_time, checkout_time, pay_method, pay_status, amount, remark, cancel_reason, \
     rejection_reason, cancel_time, estimated_delivery_time, delivery_time, pack_amount, \
     tableware_number";

/// MySQL注文リポジトリ
/// 注文（orders）と注文明細（order_detail）を一つの集約として永続化する
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 注文本体と注文明細を登録する
    async fn insert_order(
        tx: &mut Transaction<'_, MySql>,
        order: &Order,
    ) -> Result<(), RepositoryError> {
        let record = order.record();
        let id = record.id.to_string();

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, number, status, user_id, address_book_id, consignee, phone, address,
                 order_time, checkout_time, pay_method, pay_status, amount, remark,
                 cancel_reason, rejection_reason, cancel_time, estimated_delivery_time,
                 delivery_time, pack_amount, tableware_number)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&record.number)
        .bind(record.status.code())
        .bind(record.user_id.to_string())
        .bind(record.address_book_id.to_string())
        .bind(&record.consignee)
        .bind(&record.phone)
        .bind(&record.address)
        .bind(record.order_time)
        .bind(record.checkout_time)
        .bind(record.pay_method.code())
        .bind(record.pay_status.code())
        .bind(record.amount.amount())
        .bind(&record.remark)
        .bind(record.cancel_reason.as_deref())
        .bind(record.rejection_reason.as_deref())
        .bind(record.cancel_time)
        .bind(record.estimated_delivery_time)
        .bind(record.delivery_time)
        .bind(record.pack_amount.amount())
        .bind(record.tableware_number)
        .execute(&mut **tx)
        .await
        .map_err(query_failed("注文の保存に失敗しました"))?;

        for detail in order.details() {
            sqlx::query(
                r#"
                INSERT INTO order_detail
                    (order_id, name, image, dish_id, setmeal_id, dish_flavor, number, amount)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(detail.name())
            .bind(detail.image())
            .bind(detail.dish_id().map(|d| d.to_string()))
            .bind(detail.setmeal_id().map(|s| s.to_string()))
            .bind(detail.dish_flavor())
            .bind(detail.number())
            .bind(detail.amount().amount())
            .execute(&mut **tx)
            .await
            .map_err(query_failed("注文明細の保存に失敗しました"))?;
        }

        Ok(())
    }

    /// 注文IDごとに注文明細を読み込む
    async fn load_details(
        &self,
        ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderDetail>>, RepositoryError> {
        let mut details: HashMap<OrderId, Vec<OrderDetail>> = HashMap::new();
        if ids.is_empty() {
            return Ok(details);
        }

        let mut builder = QueryBuilder::<MySql>::new(
            "SELECT order_id, name, image, dish_id, setmeal_id, dish_flavor, number, amount \
             FROM order_detail WHERE order_id",
        );
        push_in_list(&mut builder, ids.iter().map(|id| id.to_string()));
        builder.push(" ORDER BY id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("注文明細の取得に失敗しました"))?;

        for row in rows {
            let (order_id, detail) = detail_from_row(&row)?;
            details.entry(order_id).or_default().push(detail);
        }
        Ok(details)
    }

    /// 注文の行から注文集約のリストを構築する
    async fn build_orders(&self, rows: Vec<MySqlRow>) -> Result<Vec<Order>, RepositoryError> {
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<OrderId> = records.iter().map(|r| r.id).collect();
        let mut details = self.load_details(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let lines = details.remove(&record.id).unwrap_or_default();
                Order::reconstruct(record, lines)
            })
            .collect())
    }

    async fn find_one(&self, column: &str, value: String) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {} FROM orders WHERE {} = ?", ORDER_COLUMNS, column);
        let rows = sqlx::query(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("注文の取得に失敗しました"))?;
        Ok(self.build_orders(rows).await?.into_iter().next())
    }
}

fn push_order_filters(builder: &mut QueryBuilder<'_, MySql>, query: &OrderQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.code());
    }
    if let Some(number) = query.number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        builder
            .push(" AND number LIKE ")
            .push_bind(format!("%{}%", number));
    }
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.to_string());
    }
}

fn detail_from_row(row: &MySqlRow) -> Result<(OrderId, OrderDetail), RepositoryError> {
    let get_optional = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文明細の取得に失敗しました"))
    };
    let get_text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文明細の取得に失敗しました"))
    };

    let order_id = OrderId::from_string(&get_text("order_id")?)
        .map_err(fetch_failed("注文IDの解析に失敗しました"))?;
    let dish_id = get_optional("dish_id")?
        .map(|raw| DishId::from_string(&raw))
        .transpose()
        .map_err(fetch_failed("菜品IDの解析に失敗しました"))?;
    let setmeal_id = get_optional("setmeal_id")?
        .map(|raw| SetmealId::from_string(&raw))
        .transpose()
        .map_err(fetch_failed("セットメニューIDの解析に失敗しました"))?;
    let number: i32 = row
        .try_get("number")
        .map_err(fetch_failed("数量の取得に失敗しました"))?;
    let amount: i64 = row
        .try_get("amount")
        .map_err(fetch_failed("金額の取得に失敗しました"))?;

    let detail = OrderDetail::new(
        get_text("name")?,
        get_text("image")?,
        dish_id,
        setmeal_id,
        get_optional("dish_flavor")?,
        u32::try_from(number).map_err(fetch_failed("数量の解析に失敗しました"))?,
        Money::new(amount).map_err(fetch_failed("金額の構築に失敗しました"))?,
    )
    .map_err(fetch_failed("注文明細の構築に失敗しました"))?;
    Ok((order_id, detail))
}

fn record_from_row(row: &MySqlRow) -> Result<OrderRecord, RepositoryError> {
    let get_text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文の取得に失敗しました"))
    };
    let get_optional = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文の取得に失敗しました"))
    };
    let get_time = |column: &str| -> Result<Option<DateTime<Utc>>, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文日時の取得に失敗しました"))
    };
    let get_code = |column: &str| -> Result<i32, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("注文コードの取得に失敗しました"))
    };
    let get_money = |column: &str| -> Result<Money, RepositoryError> {
        let raw: i64 = row
            .try_get(column)
            .map_err(fetch_failed("金額の取得に失敗しました"))?;
        Money::new(raw).map_err(fetch_failed("金額の構築に失敗しました"))
    };

    let tableware_number: i32 = get_code("tableware_number")?;

    Ok(OrderRecord {
        id: OrderId::from_string(&get_text("id")?)
            .map_err(fetch_failed("注文IDの解析に失敗しました"))?,
        number: get_text("number")?,
        status: OrderStatus::from_code(get_code("status")?)
            .map_err(fetch_failed("注文ステータスの解析に失敗しました"))?,
        user_id: UserId::from_string(&get_text("user_id")?)
            .map_err(fetch_failed("顧客IDの解析に失敗しました"))?,
        address_book_id: AddressBookId::from_string(&get_text("address_book_id")?)
            .map_err(fetch_failed("住所IDの解析に失敗しました"))?,
        consignee: get_text("consignee")?,
        phone: get_text("phone")?,
        address: get_text("address")?,
        order_time: row
            .try_get("order_time")
            .map_err(fetch_failed("注文日時の取得に失敗しました"))?,
        checkout_time: get_time("checkout_time")?,
        pay_method: PayMethod::from_code(get_code("pay_method")?)
            .map_err(fetch_failed("支払い方法の解析に失敗しました"))?,
        pay_status: PayStatus::from_code(get_code("pay_status")?)
            .map_err(fetch_failed("支払いステータスの解析に失敗しました"))?,
        amount: get_money("amount")?,
        remark: get_text("remark")?,
        cancel_reason: get_optional("cancel_reason")?,
        rejection_reason: get_optional("rejection_reason")?,
        cancel_time: get_time("cancel_time")?,
        estimated_delivery_time: get_time("estimated_delivery_time")?,
        delivery_time: get_time("delivery_time")?,
        pack_amount: get_money("pack_amount")?,
        tableware_number: u32::try_from(tableware_number)
            .map_err(fetch_failed("食器数の解析に失敗しました"))?,
    })
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn place(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        Self::insert_order(&mut tx, order).await?;

        // 注文した内容はカートから消す
        sqlx::query("DELETE FROM shopping_cart WHERE user_id = ?")
            .bind(order.user_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("カートのクリアに失敗しました"))?;

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let record = order.record();
        // 注文明細は確定後に変わらないので本体の状態だけを更新する
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?, checkout_time = ?, pay_status = ?, cancel_reason = ?,
                rejection_reason = ?, cancel_time = ?, estimated_delivery_time = ?,
                delivery_time = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(record.status.code())
        .bind(record.checkout_time)
        .bind(record.pay_status.code())
        .bind(record.cancel_reason.as_deref())
        .bind(record.rejection_reason.as_deref())
        .bind(record.cancel_time)
        .bind(record.estimated_delivery_time)
        .bind(record.delivery_time)
        .bind(record.id.to_string())
        .bind(order.loaded_status().code())
        .execute(&self.pool)
        .await
        .map_err(query_failed("注文の保存に失敗しました"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "注文のステータスが更新されています: {}",
                record.number
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.find_one("id", id.to_string()).await
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Order>, RepositoryError> {
        self.find_one("number", number.to_string()).await
    }

    async fn find_page(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM orders");
        push_order_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("注文の件数取得に失敗しました"))?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        push_order_filters(&mut select, query);
        select
            .push(" ORDER BY order_time DESC LIMIT ")
            .push_bind(page.page_size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("注文の検索に失敗しました"))?;
        let records = self.build_orders(rows).await?;

        Ok(Page::new(total.max(0) as u64, records))
    }

    async fn find_by_status_before(
        &self,
        status: OrderStatus,
        order_time: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE status = ? AND order_time < ? ORDER BY order_time",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status.code())
            .bind(order_time)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("期限切れ注文の取得に失敗しました"))?;
        self.build_orders(rows).await
    }

    async fn count_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM orders WHERE order_time >= ");
        count.push_bind(begin).push(" AND order_time < ").push_bind(end);
        if let Some(status) = status {
            count.push(" AND status = ").push_bind(status.code());
        }
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("注文の件数取得に失敗しました"))?;
        Ok(total.max(0) as u64)
    }

    async fn sum_amount_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: OrderStatus,
    ) -> Result<Money, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(amount), 0) AS SIGNED) FROM orders
            WHERE status = ? AND order_time >= ? AND order_time < ?
            "#,
        )
        .bind(status.code())
        .bind(begin)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed("売上の集計に失敗しました"))?;
        Money::new(total).map_err(fetch_failed("売上金額の構築に失敗しました"))
    }

    async fn top_sales(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SalesRank>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT od.name, CAST(SUM(od.number) AS SIGNED) AS total
            FROM order_detail od
            JOIN orders o ON o.id = od.order_id
            WHERE o.status = ? AND o.order_time >= ? AND o.order_time < ?
            GROUP BY od.name
            ORDER BY total DESC, od.name
            LIMIT ?
            "#,
        )
        .bind(OrderStatus::Completed.code())
        .bind(begin)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("販売ランキングの集計に失敗しました"))?;

        rows.iter()
            .map(|row| {
                let total: i64 = row
                    .try_get("total")
                    .map_err(fetch_failed("販売数量の取得に失敗しました"))?;
                Ok(SalesRank {
                    name: row
                        .try_get("name")
                        .map_err(fetch_failed("商品名の取得に失敗しました"))?,
                    number: total.max(0) as u64,
                })
            })
            .collect()
    }
}
