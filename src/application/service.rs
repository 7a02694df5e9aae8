// アプリケーションサービス
// 管理コンソール向けと顧客向けのユースケースを提供する

mod address_book_service;
mod dish_service;
mod employee_service;
mod order_query_service;
mod order_service;
mod order_timeout_service;
mod report_service;
mod setmeal_service;
mod shop_service;
mod shopping_cart_service;
mod user_service;

pub use address_book_service::AddressBookApplicationService;
pub use dish_service::DishApplicationService;
pub use employee_service::EmployeeApplicationService;
pub use order_query_service::{OrderQueryService, OrderStatistics};
pub use order_service::{OrderApplicationService, OrderSubmitted};
pub use order_timeout_service::{OrderTimeoutService, SweepReport};
pub use report_service::{OrderReport, ReportService, TurnoverReport};
pub use setmeal_service::{SetmealApplicationService, SetmealDishItem};
pub use shop_service::ShopApplicationService;
pub use shopping_cart_service::ShoppingCartApplicationService;
pub use user_service::UserApplicationService;
