use crate::application::ApplicationError;
use crate::domain::model::User;
use crate::domain::port::UserRepository;
use std::sync::Arc;

/// 顧客アプリケーションサービス
pub struct UserApplicationService {
    user_repository: Arc<dyn UserRepository>,
}

impl UserApplicationService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// 外部認証の識別子でログイン
    /// 初回ログイン時は顧客を自動登録する
    ///
    /// # Arguments
    /// * `openid` - 外部認証サービスが発行した識別子
    pub async fn login(&self, openid: &str) -> Result<User, ApplicationError> {
        if let Some(user) = self.user_repository.find_by_openid(openid).await? {
            return Ok(user);
        }

        let user = User::register(self.user_repository.next_identity(), openid.to_string())?;
        self.user_repository.save(&user).await?;
        tracing::info!(user_id = %user.id(), "新しい顧客を登録しました");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryUserRepository;
    use crate::domain::error::DomainError;

    #[tokio::test]
    async fn test_login_registers_once() {
        let service = UserApplicationService::new(Arc::new(InMemoryUserRepository::new()));

        let first = service.login("wx-openid-001").await.unwrap();
        let second = service.login("wx-openid-001").await.unwrap();
        assert_eq!(first.id(), second.id());

        let other = service.login("wx-openid-002").await.unwrap();
        assert_ne!(first.id(), other.id());
    }

    #[tokio::test]
    async fn test_blank_openid_is_rejected() {
        let service = UserApplicationService::new(Arc::new(InMemoryUserRepository::new()));
        let result = service.login(" ").await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::Validation(_)))
        ));
    }
}
