use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::model::{
    AddressBookId, AddressDraft, CartProduct, CategoryId, DishDraft, DishFlavor, DishId,
    EmployeeProfile, Money, OrderRequest, OrderStatus, PageRequest, PayMethod, SetmealDish,
    SetmealDraft, SetmealId, Status,
};
use crate::domain::port::MenuQuery;

/// リクエストで受け付ける金額の上限（100万元）
pub const MAX_AMOUNT: i64 = 100_000_000;

/// リクエストの金額（分）を検証してMoneyにする
fn money(amount: i64) -> Result<Money, DomainError> {
    if amount > MAX_AMOUNT {
        return Err(DomainError::Validation(format!(
            "金額は{}分以下で指定してください",
            MAX_AMOUNT
        )));
    }
    Money::new(amount)
}

/// 従業員ログイン用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct EmployeeLoginRequest {
    pub username: String,
    pub password: String,
}

/// 従業員登録・更新用のリクエストDTO
/// 更新時は `id` が必須
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    pub id: Option<Uuid>,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub id_number: String,
}

impl EmployeeRequest {
    pub fn into_profile(self) -> EmployeeProfile {
        EmployeeProfile {
            username: self.username,
            name: self.name,
            phone: self.phone,
            sex: self.sex,
            id_number: self.id_number,
        }
    }
}

/// 従業員一覧のクエリパラメータ
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePageQuery {
    pub name: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl EmployeePageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// 対象IDのクエリパラメータ（状態変更用）
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Uuid,
}

/// 一括削除のクエリパラメータ
/// `ids=a,b,c` のカンマ区切り
#[derive(Deserialize)]
pub struct IdsQuery {
    pub ids: String,
}

impl IdsQuery {
    pub fn parse(&self) -> Result<Vec<Uuid>, DomainError> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| DomainError::InvalidValue(format!("無効なID: {}", s)))
            })
            .collect()
    }
}

/// 分類IDのクエリパラメータ（顧客向けメニュー）
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub category_id: Uuid,
}

/// 菜品・セットメニュー一覧のクエリパラメータ
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuPageQuery {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<i32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl MenuPageQuery {
    pub fn to_query(&self) -> Result<MenuQuery, DomainError> {
        Ok(MenuQuery {
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            category_id: self.category_id.map(CategoryId::from_uuid),
            status: self.status.map(Status::from_code).transpose()?,
        })
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// 味付けオプションのリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct FlavorRequest {
    pub name: String,
    pub value: String,
}

/// 菜品登録・更新用のリクエストDTO
/// 価格は「分」単位
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub category_id: Uuid,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<i32>,
    #[serde(default)]
    pub flavors: Vec<FlavorRequest>,
}

impl DishRequest {
    /// 登録時の状態（指定がなければ販売停止）
    pub fn initial_status(&self) -> Result<Status, DomainError> {
        self.status
            .map(Status::from_code)
            .transpose()
            .map(|s| s.unwrap_or(Status::Disabled))
    }

    pub fn into_draft(self) -> Result<DishDraft, DomainError> {
        let flavors = self
            .flavors
            .into_iter()
            .map(|f| DishFlavor::new(f.name, f.value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DishDraft {
            name: self.name,
            category_id: CategoryId::from_uuid(self.category_id),
            price: money(self.price)?,
            image: self.image,
            description: self.description,
            flavors,
        })
    }
}

/// セット内菜品のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetmealDishRequest {
    pub dish_id: Uuid,
    pub name: String,
    pub price: i64,
    pub copies: u32,
}

/// セットメニュー登録・更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetmealRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub category_id: Uuid,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<i32>,
    #[serde(default)]
    pub setmeal_dishes: Vec<SetmealDishRequest>,
}

impl SetmealRequest {
    /// 登録時の状態（指定がなければ販売停止）
    pub fn initial_status(&self) -> Result<Status, DomainError> {
        self.status
            .map(Status::from_code)
            .transpose()
            .map(|s| s.unwrap_or(Status::Disabled))
    }

    pub fn into_draft(self) -> Result<SetmealDraft, DomainError> {
        let dishes = self
            .setmeal_dishes
            .into_iter()
            .map(|d| {
                SetmealDish::new(
                    DishId::from_uuid(d.dish_id),
                    d.name,
                    money(d.price)?,
                    d.copies,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SetmealDraft {
            name: self.name,
            category_id: CategoryId::from_uuid(self.category_id),
            price: money(self.price)?,
            image: self.image,
            description: self.description,
            dishes,
        })
    }
}

/// 顧客ログイン用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UserLoginRequest {
    pub openid: String,
}

/// カート操作用のリクエストDTO
/// 菜品IDとセットメニューIDはどちらか一方
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub dish_id: Option<Uuid>,
    pub setmeal_id: Option<Uuid>,
    pub dish_flavor: Option<String>,
}

impl CartRequest {
    pub fn into_product(self) -> Result<CartProduct, DomainError> {
        CartProduct::from_parts(
            self.dish_id.map(DishId::from_uuid),
            self.setmeal_id.map(SetmealId::from_uuid),
            self.dish_flavor,
        )
    }
}

/// 住所登録・更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub id: Option<Uuid>,
    pub consignee: String,
    pub phone: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub province_name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub district_name: String,
    pub detail: String,
    #[serde(default)]
    pub label: String,
}

impl AddressRequest {
    pub fn into_draft(self) -> AddressDraft {
        AddressDraft {
            consignee: self.consignee,
            phone: self.phone,
            sex: self.sex,
            province_name: self.province_name,
            city_name: self.city_name,
            district_name: self.district_name,
            detail: self.detail,
            label: self.label,
        }
    }
}

/// IDだけを運ぶリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct IdRequest {
    pub id: Uuid,
}

/// 注文確定用のリクエストDTO
/// 金額は「分」単位
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmitRequest {
    pub address_book_id: Uuid,
    pub pay_method: i32,
    #[serde(default)]
    pub remark: String,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pack_amount: i64,
    #[serde(default)]
    pub tableware_number: u32,
}

impl OrderSubmitRequest {
    pub fn into_request(self) -> Result<OrderRequest, DomainError> {
        Ok(OrderRequest {
            address_book_id: AddressBookId::from_uuid(self.address_book_id),
            pay_method: PayMethod::from_code(self.pay_method)?,
            remark: self.remark,
            estimated_delivery_time: self.estimated_delivery_time,
            pack_amount: money(self.pack_amount)?,
            tableware_number: self.tableware_number,
        })
    }
}

/// 支払い完了通知用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_number: String,
}

/// 注文拒否用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRequest {
    pub id: Uuid,
    pub rejection_reason: String,
}

/// 店舗側キャンセル用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub id: Uuid,
    pub cancel_reason: String,
}

/// 注文一覧のクエリパラメータ
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageQuery {
    pub status: Option<i32>,
    pub number: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderPageQuery {
    pub fn status(&self) -> Result<Option<OrderStatus>, DomainError> {
        self.status.map(OrderStatus::from_code).transpose()
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// 集計期間のクエリパラメータ（両端を含む）
#[derive(Deserialize)]
pub struct ReportQuery {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_request_from_camel_case_json() {
        let json = r#"{
            "name": "宮保鶏丁",
            "categoryId": "7f1c2a4e-0f0a-4a39-9d8c-0a9f3c1d2e3b",
            "price": 2800,
            "flavors": [{"name": "辛さ", "value": "[\"中辛\",\"激辛\"]"}]
        }"#;

        let request: DishRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.initial_status().unwrap(), Status::Disabled);

        let draft = request.into_draft().unwrap();
        assert_eq!(draft.price, Money::cny(2800));
        assert_eq!(draft.flavors.len(), 1);
        assert_eq!(draft.flavors[0].name(), "辛さ");
    }

    #[test]
    fn test_dish_request_negative_price_is_rejected() {
        let request = DishRequest {
            id: None,
            name: "x".to_string(),
            category_id: Uuid::new_v4(),
            price: -1,
            image: String::new(),
            description: String::new(),
            status: None,
            flavors: vec![],
        };
        assert!(matches!(request.into_draft(), Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn test_ids_query_parse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let query = IdsQuery {
            ids: format!("{}, {},", a, b),
        };
        assert_eq!(query.parse().unwrap(), vec![a, b]);

        let bad = IdsQuery {
            ids: "1,2".to_string(),
        };
        assert!(bad.parse().is_err());
    }

    #[test]
    fn test_cart_request_requires_exactly_one_product() {
        let both = CartRequest {
            dish_id: Some(Uuid::new_v4()),
            setmeal_id: Some(Uuid::new_v4()),
            dish_flavor: None,
        };
        assert!(both.into_product().is_err());

        let dish = CartRequest {
            dish_id: Some(Uuid::new_v4()),
            setmeal_id: None,
            dish_flavor: Some("微辛".to_string()),
        };
        assert_eq!(dish.into_product().unwrap().flavor(), Some("微辛"));
    }

    #[test]
    fn test_order_submit_request_unknown_pay_method() {
        let request = OrderSubmitRequest {
            address_book_id: Uuid::new_v4(),
            pay_method: 9,
            remark: String::new(),
            estimated_delivery_time: None,
            pack_amount: 0,
            tableware_number: 0,
        };
        assert!(request.into_request().is_err());
    }

    #[test]
    fn test_menu_page_query_blank_name_is_ignored() {
        let query = MenuPageQuery {
            name: Some("  ".to_string()),
            category_id: None,
            status: Some(1),
            page: None,
            page_size: None,
        };
        let menu = query.to_query().unwrap();
        assert_eq!(menu.name, None);
        assert_eq!(menu.status, Some(Status::Enabled));
        assert_eq!(query.page_request(), PageRequest::default());
    }

    #[test]
    fn test_amounts_above_limit_are_rejected() {
        let request = OrderSubmitRequest {
            address_book_id: Uuid::new_v4(),
            pay_method: 1,
            remark: String::new(),
            estimated_delivery_time: None,
            pack_amount: i64::MAX,
            tableware_number: 0,
        };
        assert!(matches!(request.into_request(), Err(DomainError::Validation(_))));

        let dish = DishRequest {
            id: None,
            name: "x".to_string(),
            category_id: Uuid::new_v4(),
            price: MAX_AMOUNT + 1,
            image: String::new(),
            description: String::new(),
            status: None,
            flavors: vec![],
        };
        assert!(dish.into_draft().is_err());
        assert_eq!(money(MAX_AMOUNT), Ok(Money::cny(MAX_AMOUNT)));
    }

    #[test]
    fn test_report_query_parses_dates() {
        let query: ReportQuery =
            serde_json::from_str(r#"{"begin": "2024-03-01", "end": "2024-03-07"}"#).unwrap();
        assert_eq!(query.begin, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!((query.end - query.begin).num_days(), 6);
    }
}
