use crate::domain::error::DomainError;
use crate::domain::model::{ensure_max_chars, UserId};
use chrono::{DateTime, Utc};

/// 顧客
/// 外部認証サービスが発行する識別子（openid）で一意に特定する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    openid: String,
    name: Option<String>,
    phone: Option<String>,
    create_time: DateTime<Utc>,
}

impl User {
    /// 初回ログイン時に顧客を登録
    pub fn register(id: UserId, openid: String) -> Result<Self, DomainError> {
        if openid.trim().is_empty() {
            return Err(DomainError::Validation("openidは空にできません".to_string()));
        }
        ensure_max_chars("openid", &openid, 45)?;
        Ok(Self {
            id,
            openid,
            name: None,
            phone: None,
            create_time: Utc::now(),
        })
    }

    pub fn reconstruct(
        id: UserId,
        openid: String,
        name: Option<String>,
        phone: Option<String>,
        create_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            openid,
            name,
            phone,
            create_time,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn openid(&self) -> &str {
        &self.openid
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_requires_openid() {
        assert!(User::register(UserId::new(), "  ".to_string()).is_err());
        let user = User::register(UserId::new(), "wx-123".to_string()).unwrap();
        assert_eq!(user.openid(), "wx-123");
        assert!(user.name().is_none());
        assert!(User::register(UserId::new(), "o".repeat(46)).is_err());
    }
}
