use crate::adapter::database_error::{fetch_failed, query_failed};
use crate::domain::model::{AuditInfo, Employee, EmployeeId, Page, PageRequest, Status};
use crate::domain::port::{EmployeeRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, QueryBuilder, Row};

const EMPLOYEE_COLUMNS: &str = "id, username, name, password, phone, sex, id_number, status, \
     create_time, update_time, create_user, update_user";

/// MySQL従業員リポジトリ
pub struct MySqlEmployeeRepository {
    pool: Pool<MySql>,
}

impl MySqlEmployeeRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// 監査カラムを読み取る
pub(super) fn audit_from_row(row: &MySqlRow) -> Result<AuditInfo, RepositoryError> {
    let parse_actor = |column: &str| -> Result<Option<EmployeeId>, RepositoryError> {
        row.try_get::<Option<String>, _>(column)
            .map_err(fetch_failed("監査カラムの取得に失敗しました"))?
            .map(|raw| EmployeeId::from_string(&raw))
            .transpose()
            .map_err(fetch_failed("操作者IDの解析に失敗しました"))
    };

    Ok(AuditInfo::reconstruct(
        row.try_get("create_time")
            .map_err(fetch_failed("作成日時の取得に失敗しました"))?,
        row.try_get("update_time")
            .map_err(fetch_failed("更新日時の取得に失敗しました"))?,
        parse_actor("create_user")?,
        parse_actor("update_user")?,
    ))
}

pub(super) fn status_from_row(row: &MySqlRow) -> Result<Status, RepositoryError> {
    let code: i32 = row
        .try_get("status")
        .map_err(fetch_failed("ステータスの取得に失敗しました"))?;
    Status::from_code(code).map_err(fetch_failed("ステータスの解析に失敗しました"))
}

fn employee_from_row(row: &MySqlRow) -> Result<Employee, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column)
            .map_err(fetch_failed("従業員の取得に失敗しました"))
    };

    let id = EmployeeId::from_string(&text("id")?)
        .map_err(fetch_failed("従業員IDの解析に失敗しました"))?;

    Ok(Employee::reconstruct(
        id,
        text("username")?,
        text("name")?,
        text("password")?,
        text("phone")?,
        text("sex")?,
        text("id_number")?,
        status_from_row(row)?,
        audit_from_row(row)?,
    ))
}

#[async_trait]
impl EmployeeRepository for MySqlEmployeeRepository {
    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError> {
        let audit = employee.audit();
        let id = employee.id().to_string();

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("従業員の確認に失敗しました"))?;

        let query = if exists > 0 {
            sqlx::query(
                r#"
                UPDATE employee
                SET username = ?, name = ?, password = ?, phone = ?, sex = ?, id_number = ?,
                    status = ?, update_time = ?, update_user = ?
                WHERE id = ?
                "#,
            )
            .bind(employee.username())
            .bind(employee.name())
            .bind(employee.password_hash())
            .bind(employee.phone())
            .bind(employee.sex())
            .bind(employee.id_number())
            .bind(employee.status().code())
            .bind(audit.update_time())
            .bind(audit.update_user().map(|u| u.to_string()))
            .bind(&id)
        } else {
            sqlx::query(
                r#"
                INSERT INTO employee
                    (id, username, name, password, phone, sex, id_number, status,
                     create_time, update_time, create_user, update_user)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(employee.username())
            .bind(employee.name())
            .bind(employee.password_hash())
            .bind(employee.phone())
            .bind(employee.sex())
            .bind(employee.id_number())
            .bind(employee.status().code())
            .bind(audit.create_time())
            .bind(audit.update_time())
            .bind(audit.create_user().map(|u| u.to_string()))
            .bind(audit.update_user().map(|u| u.to_string()))
        };

        query
            .execute(&self.pool)
            .await
            .map_err(query_failed("従業員の保存に失敗しました"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let sql = format!("SELECT {} FROM employee WHERE id = ?", EMPLOYEE_COLUMNS);
        sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("従業員の取得に失敗しました"))?
            .as_ref()
            .map(employee_from_row)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, RepositoryError> {
        let sql = format!("SELECT {} FROM employee WHERE username = ?", EMPLOYEE_COLUMNS);
        sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("従業員の取得に失敗しました"))?
            .as_ref()
            .map(employee_from_row)
            .transpose()
    }

    async fn find_page(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Employee>, RepositoryError> {
        let pattern = name
            .filter(|n| !n.trim().is_empty())
            .map(|n| format!("%{}%", n.trim()));

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM employee");
        if let Some(pattern) = &pattern {
            count.push(" WHERE name LIKE ").push_bind(pattern.clone());
        }
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("従業員の件数取得に失敗しました"))?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM employee", EMPLOYEE_COLUMNS));
        if let Some(pattern) = pattern {
            select.push(" WHERE name LIKE ").push_bind(pattern);
        }
        select
            .push(" ORDER BY create_time DESC LIMIT ")
            .push_bind(page.page_size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("従業員の検索に失敗しました"))?;
        let records = rows
            .iter()
            .map(employee_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(total.max(0) as u64, records))
    }
}
