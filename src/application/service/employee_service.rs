use crate::application::ApplicationError;
use crate::domain::model::{Employee, EmployeeId, EmployeeProfile, Page, PageRequest, Status};
use crate::domain::port::{EmployeeRepository, PasswordHasher, RepositoryError};
use std::sync::Arc;

/// 従業員アプリケーションサービス
/// 管理コンソールのログインと従業員管理を担当
pub struct EmployeeApplicationService {
    employee_repository: Arc<dyn EmployeeRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl EmployeeApplicationService {
    /// 新しい従業員アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `employee_repository` - 従業員リポジトリ
    /// * `password_hasher` - パスワードハッシュ化
    pub fn new(
        employee_repository: Arc<dyn EmployeeRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            employee_repository,
            password_hasher,
        }
    }

    /// ユーザー名とパスワードでログイン
    ///
    /// # Returns
    /// * `Ok(Employee)` - 認証に成功した従業員
    /// * `Err(ApplicationError::NotFound)` - アカウントが存在しない
    /// * `Err(ApplicationError::DomainError)` - パスワード不一致またはアカウントロック
    pub async fn login(&self, username: &str, password: &str) -> Result<Employee, ApplicationError> {
        let employee = self
            .employee_repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("アカウントが存在しません: {}", username))
            })?;

        employee.verify_login(&self.password_hasher.hash(password))?;

        tracing::info!(employee_id = %employee.id(), "従業員がログインしました");
        Ok(employee)
    }

    /// 従業員を新規登録
    /// 初期パスワードは `Employee::DEFAULT_PASSWORD`
    pub async fn create_employee(
        &self,
        profile: EmployeeProfile,
        actor: Option<EmployeeId>,
    ) -> Result<EmployeeId, ApplicationError> {
        self.ensure_username_available(&profile.username, None).await?;

        let id = self.employee_repository.next_identity();
        let password_hash = self.password_hasher.hash(Employee::DEFAULT_PASSWORD);
        let employee = Employee::new(id, profile, password_hash, actor)?;

        self.employee_repository
            .save(&employee)
            .await
            .map_err(map_duplicate_username)?;
        Ok(id)
    }

    /// 氏名の部分一致でページング検索
    pub async fn page_query(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Employee>, ApplicationError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.employee_repository
            .find_page(name, page)
            .await
            .map_err(ApplicationError::from)
    }

    /// アカウントの有効・無効を切り替える
    pub async fn change_status(
        &self,
        id: EmployeeId,
        status: Status,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut employee = self.get_by_id(id).await?;
        employee.change_status(status, actor);
        self.employee_repository.save(&employee).await?;
        Ok(())
    }

    /// IDで従業員を取得
    pub async fn get_by_id(&self, id: EmployeeId) -> Result<Employee, ApplicationError> {
        self.employee_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("従業員が見つかりません: {}", id)))
    }

    /// 従業員の属性を更新
    pub async fn update_employee(
        &self,
        id: EmployeeId,
        profile: EmployeeProfile,
        actor: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        let mut employee = self.get_by_id(id).await?;
        if employee.username() != profile.username {
            self.ensure_username_available(&profile.username, Some(id)).await?;
        }

        employee.update_profile(profile, actor)?;
        self.employee_repository
            .save(&employee)
            .await
            .map_err(map_duplicate_username)?;
        Ok(())
    }

    async fn ensure_username_available(
        &self,
        username: &str,
        owner: Option<EmployeeId>,
    ) -> Result<(), ApplicationError> {
        match self.employee_repository.find_by_username(username).await? {
            Some(existing) if Some(existing.id()) != owner => Err(ApplicationError::AlreadyExists(
                format!("ユーザー名は既に使われています: {}", username),
            )),
            _ => Ok(()),
        }
    }
}

fn map_duplicate_username(err: RepositoryError) -> ApplicationError {
    match err {
        RepositoryError::DuplicateEntry(msg) => ApplicationError::AlreadyExists(msg),
        other => ApplicationError::RepositoryError(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::{InMemoryEmployeeRepository, Sha256PasswordHasher};
    use crate::domain::error::DomainError;

    fn service() -> EmployeeApplicationService {
        EmployeeApplicationService::new(
            Arc::new(InMemoryEmployeeRepository::new()),
            Arc::new(Sha256PasswordHasher),
        )
    }

    fn profile(username: &str) -> EmployeeProfile {
        EmployeeProfile {
            username: username.to_string(),
            name: String::new(),
            phone: "13812345678".to_string(),
            sex: "1".to_string(),
            id_number: "110101199001011234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_employee_with_default_password() {
        let service = service();
        let id = service.create_employee(profile("zhangsan"), None).await.unwrap();

        let employee = service.get_by_id(id).await.unwrap();
        assert_eq!(employee.name(), "zhangsan");
        assert_eq!(employee.status(), Status::Enabled);

        let logged_in = service.login("zhangsan", "123456").await.unwrap();
        assert_eq!(logged_in.id(), id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let service = service();
        service.create_employee(profile("lisi"), None).await.unwrap();

        let result = service.create_employee(profile("lisi"), None).await;
        assert!(matches!(result, Err(ApplicationError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_login_errors() {
        let service = service();
        let id = service.create_employee(profile("wangwu"), None).await.unwrap();

        let missing = service.login("nobody", "123456").await;
        assert!(matches!(missing, Err(ApplicationError::NotFound(_))));

        let wrong = service.login("wangwu", "654321").await;
        assert!(matches!(
            wrong,
            Err(ApplicationError::DomainError(DomainError::PasswordMismatch))
        ));

        service.change_status(id, Status::Disabled, None).await.unwrap();
        let locked = service.login("wangwu", "123456").await;
        assert!(matches!(
            locked,
            Err(ApplicationError::DomainError(DomainError::AccountLocked))
        ));
    }

    #[tokio::test]
    async fn test_update_to_taken_username_fails() {
        let service = service();
        service.create_employee(profile("a"), None).await.unwrap();
        let b = service.create_employee(profile("b"), None).await.unwrap();

        let result = service.update_employee(b, profile("a"), None).await;
        assert!(matches!(result, Err(ApplicationError::AlreadyExists(_))));

        // 自分自身のユーザー名はそのまま使える
        let mut same = profile("b");
        same.name = "Bさん".to_string();
        service.update_employee(b, same, None).await.unwrap();
        assert_eq!(service.get_by_id(b).await.unwrap().name(), "Bさん");
    }

    #[tokio::test]
    async fn test_page_query_filters_by_name() {
        let service = service();
        for username in ["chen1", "chen2", "liu"] {
            service.create_employee(profile(username), None).await.unwrap();
        }

        let page = service
            .page_query(Some("chen"), PageRequest::new(Some(1), Some(10)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let all = service.page_query(Some("  "), PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 3);
    }
}
