use crate::domain::error::DomainError;
use crate::domain::port::{RepositoryError, ShopStatusError};

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、イベント発行エラーをラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// 営業状態ストアのエラー
    #[error("Shop status error: {0}")]
    ShopStatusError(#[from] ShopStatusError),
    /// イベントバス発行エラー
    #[error("Event publishing failed: {0}")]
    EventPublishingFailed(String),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 認証されていない、または権限がない
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 既に存在する（一意制約違反）
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}
