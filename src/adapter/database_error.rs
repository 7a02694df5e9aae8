use crate::domain::port::RepositoryError;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionError(err.to_string())
            }
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) => RepositoryError::OperationFailed(msg),
            DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

/// クエリ失敗をリポジトリエラーに変換する
/// 一意制約違反は `DuplicateEntry` になる
pub(crate) fn query_failed(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return RepositoryError::DuplicateEntry(format!("{}: {}", context, db_err));
            }
        }
        let err = match DatabaseError::from(err) {
            DatabaseError::ConnectionError(msg) => {
                DatabaseError::ConnectionError(format!("{}: {}", context, msg))
            }
            DatabaseError::QueryError(msg) | DatabaseError::MigrationError(msg) => {
                DatabaseError::QueryError(format!("{}: {}", context, msg))
            }
        };
        RepositoryError::from(err)
    }
}

/// 取得した行の解析失敗をリポジトリエラーに変換する
pub(crate) fn fetch_failed<E: std::fmt::Display>(
    context: &'static str,
) -> impl Fn(E) -> RepositoryError {
    move |err| RepositoryError::FetchFailed(format!("{}: {}", context, err))
}
