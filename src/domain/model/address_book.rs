use crate::domain::error::DomainError;
use crate::domain::model::{ensure_max_chars, AddressBookId, UserId};

/// 顧客の配送先住所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBook {
    id: AddressBookId,
    user_id: UserId,
    consignee: String,
    phone: String,
    sex: String,
    province_name: String,
    city_name: String,
    district_name: String,
    detail: String,
    label: String,
    is_default: bool,
}

/// 住所の入力値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDraft {
    pub consignee: String,
    pub phone: String,
    pub sex: String,
    pub province_name: String,
    pub city_name: String,
    pub district_name: String,
    pub detail: String,
    pub label: String,
}

impl AddressBook {
    /// 新しい住所を作成
    /// 受取人、電話番号、詳細住所は必須
    pub fn new(id: AddressBookId, user_id: UserId, draft: AddressDraft) -> Result<Self, DomainError> {
        if draft.consignee.trim().is_empty() {
            return Err(DomainError::Validation("受取人は空にできません".to_string()));
        }
        if draft.phone.trim().is_empty() {
            return Err(DomainError::Validation("電話番号は空にできません".to_string()));
        }
        if draft.detail.trim().is_empty() {
            return Err(DomainError::Validation("詳細住所は空にできません".to_string()));
        }
        ensure_max_chars("受取人", &draft.consignee, 50)?;
        ensure_max_chars("電話番号", &draft.phone, 11)?;
        ensure_max_chars("性別", &draft.sex, 2)?;
        ensure_max_chars("省", &draft.province_name, 32)?;
        ensure_max_chars("市", &draft.city_name, 32)?;
        ensure_max_chars("区", &draft.district_name, 32)?;
        ensure_max_chars("詳細住所", &draft.detail, 200)?;
        ensure_max_chars("ラベル", &draft.label, 100)?;
        Ok(Self {
            id,
            user_id,
            consignee: draft.consignee,
            phone: draft.phone,
            sex: draft.sex,
            province_name: draft.province_name,
            city_name: draft.city_name,
            district_name: draft.district_name,
            detail: draft.detail,
            label: draft.label,
            is_default: false,
        })
    }

    /// データベースから取得したデータで再構築
    pub fn reconstruct(
        id: AddressBookId,
        user_id: UserId,
        draft: AddressDraft,
        is_default: bool,
    ) -> Self {
        Self {
            id,
            user_id,
            consignee: draft.consignee,
            phone: draft.phone,
            sex: draft.sex,
            province_name: draft.province_name,
            city_name: draft.city_name,
            district_name: draft.district_name,
            detail: draft.detail,
            label: draft.label,
            is_default,
        }
    }

    pub fn id(&self) -> AddressBookId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn consignee(&self) -> &str {
        &self.consignee
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn sex(&self) -> &str {
        &self.sex
    }

    pub fn province_name(&self) -> &str {
        &self.province_name
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn district_name(&self) -> &str {
        &self.district_name
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    /// 注文に記録する完全な住所
    pub fn full_address(&self) -> String {
        format!(
            "{}{}{}{}",
            self.province_name, self.city_name, self.district_name, self.detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(consignee: &str) -> AddressDraft {
        AddressDraft {
            consignee: consignee.to_string(),
            phone: "13900000000".to_string(),
            sex: "0".to_string(),
            province_name: "北京市".to_string(),
            city_name: "北京市".to_string(),
            district_name: "海淀区".to_string(),
            detail: "中関村1号".to_string(),
            label: "会社".to_string(),
        }
    }

    #[test]
    fn test_full_address() {
        let address = AddressBook::new(AddressBookId::new(), UserId::new(), draft("李雷")).unwrap();
        assert_eq!(address.full_address(), "北京市北京市海淀区中関村1号");
        assert!(!address.is_default());
    }

    #[test]
    fn test_consignee_is_required() {
        let result = AddressBook::new(AddressBookId::new(), UserId::new(), draft(""));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_fields_longer_than_columns_are_rejected() {
        let mut long_phone = draft("李雷");
        long_phone.phone = "139000000001".to_string();
        assert!(AddressBook::new(AddressBookId::new(), UserId::new(), long_phone).is_err());

        let mut long_detail = draft("李雷");
        long_detail.detail = "路".repeat(201);
        assert!(AddressBook::new(AddressBookId::new(), UserId::new(), long_detail).is_err());

        let mut max_detail = draft("李雷");
        max_detail.detail = "路".repeat(200);
        assert!(AddressBook::new(AddressBookId::new(), UserId::new(), max_detail).is_ok());

        let result = AddressBook::new(AddressBookId::new(), UserId::new(), draft(&"李".repeat(51)));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
