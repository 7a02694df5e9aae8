pub mod app_config;
pub mod database_config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;

pub use app_config::AppConfig;
pub use database_config::{ConfigError, DatabaseConfig};
pub use database_migration::DatabaseMigration;
