use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::application::service::{
    OrderReport, OrderStatistics, OrderSubmitted, SetmealDishItem, TurnoverReport,
};
use crate::domain::port::SalesRank;
use crate::domain::model::{
    AddressBook, CartItem, Dish, Employee, Order, OrderDetail, Page, Setmeal, User,
};

/// 一覧用のページングレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> PageResponse<T> {
    pub fn from_page<S>(page: Page<S>, f: impl FnMut(&S) -> T) -> Self {
        Self {
            total: page.total,
            records: page.records.iter().map(f).collect(),
        }
    }
}

/// 登録したリソースのIDを返すレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

impl IdResponse {
    pub fn new(id: impl ToString) -> Self {
        Self { id: id.to_string() }
    }
}

/// 従業員ログイン結果のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLoginResponse {
    pub id: String,
    pub user_name: String,
    pub name: String,
    pub token: String,
}

/// 従業員のレスポンスDTO
/// パスワードは常に伏せ字
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
    pub status: i32,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub create_user: Option<String>,
    pub update_user: Option<String>,
}

impl EmployeeResponse {
    pub const MASKED_PASSWORD: &'static str = "****";

    pub fn from_employee(employee: &Employee) -> Self {
        let audit = employee.audit();
        Self {
            id: employee.id().to_string(),
            username: employee.username().to_string(),
            name: employee.name().to_string(),
            password: Self::MASKED_PASSWORD.to_string(),
            phone: employee.phone().to_string(),
            sex: employee.sex().to_string(),
            id_number: employee.id_number().to_string(),
            status: employee.status().code(),
            create_time: audit.create_time(),
            update_time: audit.update_time(),
            create_user: audit.create_user().map(|id| id.to_string()),
            update_user: audit.update_user().map(|id| id.to_string()),
        }
    }
}

/// 味付けオプションのレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct FlavorResponse {
    pub name: String,
    pub value: String,
}

/// 菜品のレスポンスDTO
/// 価格は「分」単位
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishResponse {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub price: i64,
    pub image: String,
    pub description: String,
    pub status: i32,
    pub update_time: DateTime<Utc>,
    pub flavors: Vec<FlavorResponse>,
}

impl DishResponse {
    pub fn from_dish(dish: &Dish) -> Self {
        Self {
            id: dish.id().to_string(),
            name: dish.name().to_string(),
            category_id: dish.category_id().to_string(),
            price: dish.price().amount(),
            image: dish.image().to_string(),
            description: dish.description().to_string(),
            status: dish.status().code(),
            update_time: dish.audit().update_time(),
            flavors: dish
                .flavors()
                .iter()
                .map(|f| FlavorResponse {
                    name: f.name().to_string(),
                    value: f.value().to_string(),
                })
                .collect(),
        }
    }
}

/// セット内菜品のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetmealDishResponse {
    pub dish_id: String,
    pub name: String,
    pub price: i64,
    pub copies: u32,
}

/// セットメニューのレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetmealResponse {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub price: i64,
    pub image: String,
    pub description: String,
    pub status: i32,
    pub update_time: DateTime<Utc>,
    pub setmeal_dishes: Vec<SetmealDishResponse>,
}

impl SetmealResponse {
    pub fn from_setmeal(setmeal: &Setmeal) -> Self {
        Self {
            id: setmeal.id().to_string(),
            name: setmeal.name().to_string(),
            category_id: setmeal.category_id().to_string(),
            price: setmeal.price().amount(),
            image: setmeal.image().to_string(),
            description: setmeal.description().to_string(),
            status: setmeal.status().code(),
            update_time: setmeal.audit().update_time(),
            setmeal_dishes: setmeal
                .dishes()
                .iter()
                .map(|d| SetmealDishResponse {
                    dish_id: d.dish_id().to_string(),
                    name: d.name().to_string(),
                    price: d.price().amount(),
                    copies: d.copies(),
                })
                .collect(),
        }
    }
}

/// セットメニューに含まれる菜品の表示用DTO（顧客向け）
#[derive(Serialize, Deserialize)]
pub struct DishItemResponse {
    pub name: String,
    pub copies: u32,
    pub image: String,
    pub description: String,
}

impl From<SetmealDishItem> for DishItemResponse {
    fn from(item: SetmealDishItem) -> Self {
        Self {
            name: item.name,
            copies: item.copies,
            image: item.image,
            description: item.description,
        }
    }
}

/// 顧客ログイン結果のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct UserLoginResponse {
    pub id: String,
    pub openid: String,
    pub token: String,
}

impl UserLoginResponse {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id().to_string(),
            openid: user.openid().to_string(),
            token,
        }
    }
}

/// カート明細のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: String,
    pub dish_id: Option<String>,
    pub setmeal_id: Option<String>,
    pub dish_flavor: Option<String>,
    pub name: String,
    pub image: String,
    pub amount: i64,
    pub number: u32,
    pub create_time: DateTime<Utc>,
}

impl CartItemResponse {
    pub fn from_item(item: &CartItem) -> Self {
        let product = item.product();
        Self {
            id: item.id().to_string(),
            dish_id: product.dish_id().map(|id| id.to_string()),
            setmeal_id: product.setmeal_id().map(|id| id.to_string()),
            dish_flavor: product.flavor().map(str::to_string),
            name: item.name().to_string(),
            image: item.image().to_string(),
            amount: item.amount().amount(),
            number: item.number(),
            create_time: item.created_at(),
        }
    }
}

/// 住所のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: String,
    pub user_id: String,
    pub consignee: String,
    pub phone: String,
    pub sex: String,
    pub province_name: String,
    pub city_name: String,
    pub district_name: String,
    pub detail: String,
    pub label: String,
    pub is_default: bool,
}

impl AddressResponse {
    pub fn from_address(address: &AddressBook) -> Self {
        Self {
            id: address.id().to_string(),
            user_id: address.user_id().to_string(),
            consignee: address.consignee().to_string(),
            phone: address.phone().to_string(),
            sex: address.sex().to_string(),
            province_name: address.province_name().to_string(),
            city_name: address.city_name().to_string(),
            district_name: address.district_name().to_string(),
            detail: address.detail().to_string(),
            label: address.label().to_string(),
            is_default: address.is_default(),
        }
    }
}

/// 注文確定結果のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmitResponse {
    pub id: String,
    pub order_number: String,
    pub order_amount: i64,
    pub order_time: DateTime<Utc>,
}

impl From<OrderSubmitted> for OrderSubmitResponse {
    fn from(submitted: OrderSubmitted) -> Self {
        Self {
            id: submitted.id.to_string(),
            order_number: submitted.number,
            order_amount: submitted.amount.amount(),
            order_time: submitted.order_time,
        }
    }
}

/// 注文明細のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub name: String,
    pub image: String,
    pub dish_id: Option<String>,
    pub setmeal_id: Option<String>,
    pub dish_flavor: Option<String>,
    pub number: u32,
    pub amount: i64,
}

impl OrderDetailResponse {
    fn from_detail(detail: &OrderDetail) -> Self {
        Self {
            name: detail.name().to_string(),
            image: detail.image().to_string(),
            dish_id: detail.dish_id().map(|id| id.to_string()),
            setmeal_id: detail.setmeal_id().map(|id| id.to_string()),
            dish_flavor: detail.dish_flavor().map(str::to_string),
            number: detail.number(),
            amount: detail.amount().amount(),
        }
    }
}

/// 注文のレスポンスDTO
/// `order_dishes` は「菜品名*数量;」を連結した一覧表示用の文字列
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub number: String,
    pub status: i32,
    pub user_id: String,
    pub address_book_id: String,
    pub consignee: String,
    pub phone: String,
    pub address: String,
    pub order_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub pay_method: i32,
    pub pay_status: i32,
    pub amount: i64,
    pub remark: String,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub pack_amount: i64,
    pub tableware_number: u32,
    pub order_dishes: String,
    pub order_detail_list: Vec<OrderDetailResponse>,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        let record = order.record();
        let order_dishes = order
            .details()
            .iter()
            .map(|d| format!("{}*{};", d.name(), d.number()))
            .collect::<String>();

        Self {
            id: record.id.to_string(),
            number: record.number.clone(),
            status: record.status.code(),
            user_id: record.user_id.to_string(),
            address_book_id: record.address_book_id.to_string(),
            consignee: record.consignee.clone(),
            phone: record.phone.clone(),
            address: record.address.clone(),
            order_time: record.order_time,
            checkout_time: record.checkout_time,
            pay_method: record.pay_method.code(),
            pay_status: record.pay_status.code(),
            amount: record.amount.amount(),
            remark: record.remark.clone(),
            cancel_reason: record.cancel_reason.clone(),
            rejection_reason: record.rejection_reason.clone(),
            cancel_time: record.cancel_time,
            estimated_delivery_time: record.estimated_delivery_time,
            delivery_time: record.delivery_time,
            pack_amount: record.pack_amount.amount(),
            tableware_number: record.tableware_number,
            order_dishes,
            order_detail_list: order.details().iter().map(OrderDetailResponse::from_detail).collect(),
        }
    }
}

/// 対応待ち注文件数のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatisticsResponse {
    pub to_be_confirmed: u64,
    pub confirmed: u64,
    pub delivery_in_progress: u64,
}

impl From<OrderStatistics> for OrderStatisticsResponse {
    fn from(stats: OrderStatistics) -> Self {
        Self {
            to_be_confirmed: stats.to_be_confirmed,
            confirmed: stats.confirmed,
            delivery_in_progress: stats.delivery_in_progress,
        }
    }
}

/// 日別売上のレスポンスDTO（金額は「分」単位）
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverReportResponse {
    pub date_list: Vec<NaiveDate>,
    pub turnover_list: Vec<i64>,
}

impl From<TurnoverReport> for TurnoverReportResponse {
    fn from(report: TurnoverReport) -> Self {
        Self {
            date_list: report.dates,
            turnover_list: report.turnovers.iter().map(|m| m.amount()).collect(),
        }
    }
}

/// 日別注文件数のレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReportResponse {
    pub date_list: Vec<NaiveDate>,
    pub order_count_list: Vec<u64>,
    pub valid_order_count_list: Vec<u64>,
    pub total_order_count: u64,
    pub valid_order_count: u64,
    pub order_completion_rate: f64,
}

impl From<OrderReport> for OrderReportResponse {
    fn from(report: OrderReport) -> Self {
        Self {
            date_list: report.dates,
            order_count_list: report.order_counts,
            valid_order_count_list: report.valid_order_counts,
            total_order_count: report.total_order_count,
            valid_order_count: report.valid_order_count,
            order_completion_rate: report.order_completion_rate,
        }
    }
}

/// 販売数量ランキングのレスポンスDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTopResponse {
    pub name_list: Vec<String>,
    pub number_list: Vec<u64>,
}

impl From<Vec<SalesRank>> for SalesTopResponse {
    fn from(ranks: Vec<SalesRank>) -> Self {
        let (name_list, number_list) = ranks.into_iter().map(|r| (r.name, r.number)).unzip();
        Self {
            name_list,
            number_list,
        }
    }
}
