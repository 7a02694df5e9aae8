use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::domain::model::{User, UserId};
use crate::domain::port::{RepositoryError, UserRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL顧客リポジトリ
pub struct MySqlUserRepository {
    pool: Pool<MySql>,
}

impl MySqlUserRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &MySqlRow) -> Result<User, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(fetch_failed("顧客の取得に失敗しました"))?;
    Ok(User::reconstruct(
        UserId::from_string(&id).map_err(fetch_failed("顧客IDの解析に失敗しました"))?,
        row.try_get("openid")
            .map_err(fetch_failed("顧客の取得に失敗しました"))?,
        row.try_get("name")
            .map_err(fetch_failed("顧客の取得に失敗しました"))?,
        row.try_get("phone")
            .map_err(fetch_failed("顧客の取得に失敗しました"))?,
        row.try_get("create_time")
            .map_err(fetch_failed("顧客の取得に失敗しました"))?,
    ))
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO `user` (id, openid, name, phone, create_time)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                phone = VALUES(phone)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.openid())
        .bind(user.name())
        .bind(user.phone())
        .bind(user.create_time())
        .execute(&self.pool)
        .await
        .map_err(query_failed("顧客の保存に失敗しました"))?;
        Ok(())
    }

    async fn find_by_openid(&self, openid: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query("SELECT id, openid, name, phone, create_time FROM `user` WHERE openid = ?")
            .bind(openid)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("顧客の取得に失敗しました"))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }
}
