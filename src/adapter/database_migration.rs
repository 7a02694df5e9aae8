use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// マイグレーションファイルのリスト（ファイル名, SQL）
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_employee_table",
        include_str!("../../migrations/001_create_employee_table.sql"),
    ),
    (
        "002_create_dish_table",
        include_str!("../../migrations/002_create_dish_table.sql"),
    ),
    (
        "003_create_dish_flavor_table",
        include_str!("../../migrations/003_create_dish_flavor_table.sql"),
    ),
    (
        "004_create_setmeal_table",
        include_str!("../../migrations/004_create_setmeal_table.sql"),
    ),
    (
        "005_create_setmeal_dish_table",
        include_str!("../../migrations/005_create_setmeal_dish_table.sql"),
    ),
    (
        "006_create_user_table",
        include_str!("../../migrations/006_create_user_table.sql"),
    ),
    (
        "007_create_address_book_table",
        include_str!("../../migrations/007_create_address_book_table.sql"),
    ),
    (
        "008_create_shopping_cart_table",
        include_str!("../../migrations/008_create_shopping_cart_table.sql"),
    ),
    (
        "009_create_orders_table",
        include_str!("../../migrations/009_create_orders_table.sql"),
    ),
    (
        "010_create_order_detail_table",
        include_str!("../../migrations/010_create_order_detail_table.sql"),
    ),
    (
        "011_seed_admin_employee",
        include_str!("../../migrations/011_seed_admin_employee.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS / INSERT IGNORE）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS {
            tracing::debug!(migration = name, "マイグレーションを実行します");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", name, e))
                })?;
        }

        tracing::info!(count = MIGRATIONS.len(), "マイグレーションが完了しました");
        Ok(())
    }
}
