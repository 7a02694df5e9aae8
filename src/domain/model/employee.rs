use crate::domain::error::DomainError;
use crate::domain::model::{ensure_max_chars, AuditInfo, EmployeeId, Status};

/// 従業員集約
/// 管理コンソールにログインするスタッフを表す
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    id: EmployeeId,
    username: String,
    name: String,
    password_hash: String,
    phone: String,
    sex: String,
    id_number: String,
    status: Status,
    audit: AuditInfo,
}

/// 従業員の編集可能な属性
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile {
    pub username: String,
    pub name: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
}

impl EmployeeProfile {
    /// 属性の検証
    /// ユーザー名は必須。氏名が空の場合はユーザー名を使う
    fn normalized(mut self) -> Result<Self, DomainError> {
        if self.username.trim().is_empty() {
            return Err(DomainError::Validation(
                "ユーザー名は空にできません".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            self.name = self.username.clone();
        }
        ensure_max_chars("ユーザー名", &self.username, 32)?;
        ensure_max_chars("氏名", &self.name, 32)?;
        ensure_max_chars("電話番号", &self.phone, 11)?;
        ensure_max_chars("性別", &self.sex, 2)?;
        ensure_max_chars("身分証番号", &self.id_number, 18)?;
        Ok(self)
    }
}

impl Employee {
    /// 初期パスワード
    pub const DEFAULT_PASSWORD: &'static str = "123456";

    /// 新しい従業員を作成
    /// 初期ステータスは有効
    pub fn new(
        id: EmployeeId,
        profile: EmployeeProfile,
        password_hash: String,
        actor: Option<EmployeeId>,
    ) -> Result<Self, DomainError> {
        let profile = profile.normalized()?;
        Ok(Self {
            id,
            username: profile.username,
            name: profile.name,
            password_hash,
            phone: profile.phone,
            sex: profile.sex,
            id_number: profile.id_number,
            status: Status::Enabled,
            audit: AuditInfo::created_by(actor),
        })
    }

    /// データベースから取得したデータで従業員を再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: EmployeeId,
        username: String,
        name: String,
        password_hash: String,
        phone: String,
        sex: String,
        id_number: String,
        status: Status,
        audit: AuditInfo,
    ) -> Self {
        Self {
            id,
            username,
            name,
            password_hash,
            phone,
            sex,
            id_number,
            status,
            audit,
        }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn sex(&self) -> &str {
        &self.sex
    }

    pub fn id_number(&self) -> &str {
        &self.id_number
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    /// ログイン可否を検証
    /// パスワードの照合を先に行い、その後アカウントのロックを確認する
    pub fn verify_login(&self, password_hash: &str) -> Result<(), DomainError> {
        if self.password_hash != password_hash {
            return Err(DomainError::PasswordMismatch);
        }
        if !self.status.is_enabled() {
            return Err(DomainError::AccountLocked);
        }
        Ok(())
    }

    /// 属性を更新
    pub fn update_profile(
        &mut self,
        profile: EmployeeProfile,
        actor: Option<EmployeeId>,
    ) -> Result<(), DomainError> {
        let profile = profile.normalized()?;
        self.username = profile.username;
        self.name = profile.name;
        self.phone = profile.phone;
        self.sex = profile.sex;
        self.id_number = profile.id_number;
        self.audit.touch(actor);
        Ok(())
    }

    /// アカウントの有効・無効を切り替える
    pub fn change_status(&mut self, status: Status, actor: Option<EmployeeId>) {
        self.status = status;
        self.audit.touch(actor);
    }
}
