use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::domain::model::{AddressBook, AddressBookId, AddressDraft, UserId};
use crate::domain::port::{AddressBookRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const ADDRESS_COLUMNS: &str = "id, user_id, consignee, sex, phone, province_name, city_name, \
     district_name, detail, label, is_default";

/// MySQL配送先住所リポジトリ
pub struct MySqlAddressBookRepository {
    pool: Pool<MySql>,
}

impl MySqlAddressBookRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn address_from_row(row: &MySqlRow) -> Result<AddressBook, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("住所の取得に失敗しました"))
    };

    let id = AddressBookId::from_string(&text("id")?)
        .map_err(fetch_failed("住所IDの解析に失敗しました"))?;
    let user_id =
        UserId::from_string(&text("user_id")?).map_err(fetch_failed("顧客IDの解析に失敗しました"))?;
    let is_default: bool = row
        .try_get("is_default")
        .map_err(fetch_failed("住所の取得に失敗しました"))?;

    Ok(AddressBook::reconstruct(
        id,
        user_id,
        AddressDraft {
            consignee: text("consignee")?,
            phone: text("phone")?,
            sex: text("sex")?,
            province_name: text("province_name")?,
            city_name: text("city_name")?,
            district_name: text("district_name")?,
            detail: text("detail")?,
            label: text("label")?,
        },
        is_default,
    ))
}

#[async_trait]
impl AddressBookRepository for MySqlAddressBookRepository {
    async fn save(&self, address: &AddressBook) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO address_book
                (id, user_id, consignee, sex, phone, province_name, city_name,
                 district_name, detail, label, is_default)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                consignee = VALUES(consignee),
                sex = VALUES(sex),
                phone = VALUES(phone),
                province_name = VALUES(province_name),
                city_name = VALUES(city_name),
                district_name = VALUES(district_name),
                detail = VALUES(detail),
                label = VALUES(label),
                is_default = VALUES(is_default)
            "#,
        )
        .bind(address.id().to_string())
        .bind(address.user_id().to_string())
        .bind(address.consignee())
        .bind(address.sex())
        .bind(address.phone())
        .bind(address.province_name())
        .bind(address.city_name())
        .bind(address.district_name())
        .bind(address.detail())
        .bind(address.label())
        .bind(address.is_default())
        .execute(&self.pool)
        .await
        .map_err(query_failed("住所の保存に失敗しました"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: AddressBookId) -> Result<Option<AddressBook>, RepositoryError> {
        let sql = format!("SELECT {} FROM address_book WHERE id = ?", ADDRESS_COLUMNS);
        sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("住所の取得に失敗しました"))?
            .as_ref()
            .map(address_from_row)
            .transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<AddressBook>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM address_book WHERE user_id = ? ORDER BY is_default DESC, id",
            ADDRESS_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("住所の取得に失敗しました"))?;
        rows.iter().map(address_from_row).collect()
    }

    async fn mark_default(
        &self,
        user_id: UserId,
        id: AddressBookId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("トランザクション開始に失敗しました"))?;

        sqlx::query("UPDATE address_book SET is_default = 0 WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("デフォルト住所の解除に失敗しました"))?;

        sqlx::query("UPDATE address_book SET is_default = 1 WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("デフォルト住所の設定に失敗しました"))?;

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn delete(&self, id: AddressBookId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM address_book WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("住所の削除に失敗しました"))?;
        Ok(())
    }
}
