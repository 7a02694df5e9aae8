use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use crate::adapter::driven::BroadcastShopNotifier;
use crate::adapter::driver::auth::{self, JwtKeys};
use crate::adapter::driver::{admin_api, user_api};
use crate::application::service::{
    AddressBookApplicationService, DishApplicationService, EmployeeApplicationService,
    OrderApplicationService, OrderQueryService, ReportService, SetmealApplicationService,
    ShopApplicationService, ShoppingCartApplicationService, UserApplicationService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::port::{
    AddressBookRepository, DishRepository, EmployeeRepository, EventBus, OrderRepository,
    PasswordHasher, RepositoryError, SetmealRepository, ShopStatusStore, ShoppingCartRepository,
    UserRepository,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

/// ハンドラーの戻り値
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// アプリケーションサービスが使うポートの実装一式
/// MySQL実装とインメモリ実装のどちらでも組み立てられる
pub struct Ports {
    pub employee_repository: Arc<dyn EmployeeRepository>,
    pub dish_repository: Arc<dyn DishRepository>,
    pub setmeal_repository: Arc<dyn SetmealRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub address_book_repository: Arc<dyn AddressBookRepository>,
    pub shopping_cart_repository: Arc<dyn ShoppingCartRepository>,
    pub order_repository: Arc<dyn OrderRepository>,
    pub shop_status_store: Arc<dyn ShopStatusStore>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub event_bus: Arc<dyn EventBus>,
}

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub employee_service: Arc<EmployeeApplicationService>,
    pub dish_service: Arc<DishApplicationService>,
    pub setmeal_service: Arc<SetmealApplicationService>,
    pub shop_service: Arc<ShopApplicationService>,
    pub user_service: Arc<UserApplicationService>,
    pub address_book_service: Arc<AddressBookApplicationService>,
    pub shopping_cart_service: Arc<ShoppingCartApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub report_service: Arc<ReportService>,
    pub notifier: BroadcastShopNotifier,
    pub admin_keys: JwtKeys,
    pub user_keys: JwtKeys,
}

impl AppState {
    pub fn new(
        ports: Ports,
        notifier: BroadcastShopNotifier,
        admin_keys: JwtKeys,
        user_keys: JwtKeys,
    ) -> Self {
        Self {
            employee_service: Arc::new(EmployeeApplicationService::new(
                ports.employee_repository,
                ports.password_hasher,
            )),
            dish_service: Arc::new(DishApplicationService::new(
                ports.dish_repository.clone(),
                ports.setmeal_repository.clone(),
            )),
            setmeal_service: Arc::new(SetmealApplicationService::new(
                ports.setmeal_repository.clone(),
                ports.dish_repository.clone(),
            )),
            shop_service: Arc::new(ShopApplicationService::new(ports.shop_status_store.clone())),
            user_service: Arc::new(UserApplicationService::new(ports.user_repository)),
            address_book_service: Arc::new(AddressBookApplicationService::new(
                ports.address_book_repository.clone(),
            )),
            shopping_cart_service: Arc::new(ShoppingCartApplicationService::new(
                ports.shopping_cart_repository.clone(),
                ports.dish_repository,
                ports.setmeal_repository,
            )),
            order_service: Arc::new(OrderApplicationService::new(
                ports.order_repository.clone(),
                ports.address_book_repository,
                ports.shopping_cart_repository,
                ports.shop_status_store,
                ports.event_bus,
            )),
            order_query_service: Arc::new(OrderQueryService::new(ports.order_repository.clone())),
            report_service: Arc::new(ReportService::new(ports.order_repository)),
            notifier,
            admin_keys,
            user_keys,
        }
    }
}

// REST APIルーターを作成
// /admin は従業員トークン、/user は顧客トークンが必要（ログインと営業状態の参照を除く）
pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/employee/logout", post(admin_api::employee_logout))
        .route(
            "/employee",
            post(admin_api::save_employee).put(admin_api::update_employee),
        )
        .route("/employee/page", get(admin_api::employee_page))
        .route("/employee/status/:status", post(admin_api::employee_status))
        .route("/employee/:id", get(admin_api::get_employee))
        .route(
            "/dish",
            post(admin_api::save_dish)
                .put(admin_api::update_dish)
                .delete(admin_api::delete_dishes),
        )
        .route("/dish/page", get(admin_api::dish_page))
        .route("/dish/list", get(admin_api::dish_list))
        .route("/dish/status/:status", post(admin_api::dish_status))
        .route("/dish/:id", get(admin_api::get_dish))
        .route(
            "/setmeal",
            post(admin_api::save_setmeal)
                .put(admin_api::update_setmeal)
                .delete(admin_api::delete_setmeals),
        )
        .route("/setmeal/page", get(admin_api::setmeal_page))
        .route("/setmeal/status/:status", post(admin_api::setmeal_status))
        .route("/setmeal/:id", get(admin_api::get_setmeal))
        .route("/shop/status", get(admin_api::get_shop_status))
        .route("/shop/:status", put(admin_api::set_shop_status))
        .route("/order/conditionSearch", get(admin_api::order_search))
        .route("/order/statistics", get(admin_api::order_statistics))
        .route("/order/details/:id", get(admin_api::order_details))
        .route("/order/confirm", put(admin_api::confirm_order))
        .route("/order/rejection", put(admin_api::reject_order))
        .route("/order/cancel", put(admin_api::cancel_order))
        .route("/order/delivery/:id", put(admin_api::deliver_order))
        .route("/order/complete/:id", put(admin_api::complete_order))
        .route("/report/turnoverStatistics", get(admin_api::turnover_report))
        .route("/report/ordersStatistics", get(admin_api::order_report))
        .route("/report/top10", get(admin_api::sales_top10))
        .route("/notifications", get(notifications))
        .route_layer(middleware::from_fn_with_state(
            state.admin_keys.clone(),
            auth::require_employee,
        ))
        .route("/employee/login", post(admin_api::employee_login));

    let user = Router::new()
        .route("/dish/list", get(user_api::dish_list))
        .route("/setmeal/list", get(user_api::setmeal_list))
        .route("/setmeal/dish/:id", get(user_api::setmeal_dishes))
        .route("/shoppingCart/add", post(user_api::add_to_cart))
        .route("/shoppingCart/sub", post(user_api::sub_from_cart))
        .route("/shoppingCart/list", get(user_api::list_cart))
        .route("/shoppingCart/clean", delete(user_api::clean_cart))
        .route(
            "/addressBook",
            post(user_api::add_address)
                .put(user_api::update_address)
                .delete(user_api::delete_address),
        )
        .route("/addressBook/list", get(user_api::list_addresses))
        .route("/addressBook/default", get(user_api::default_address).put(user_api::set_default_address))
        .route("/addressBook/:id", get(user_api::get_address))
        .route("/order/submit", post(user_api::submit_order))
        .route("/order/payment", put(user_api::pay_order))
        .route("/order/historyOrders", get(user_api::order_history))
        .route("/order/orderDetail/:id", get(user_api::order_detail))
        .route("/order/cancel/:id", put(user_api::cancel_order))
        .route("/order/repetition/:id", post(user_api::repeat_order))
        .route("/order/reminder/:id", get(user_api::remind_order))
        .route_layer(middleware::from_fn_with_state(
            state.user_keys.clone(),
            auth::require_user,
        ))
        .route("/user/login", post(user_api::user_login))
        .route("/shop/status", get(user_api::get_shop_status));

    Router::new()
        .route("/health", get(health_check))
        .nest("/admin", admin)
        .nest("/user", user)
        .with_state(state)
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sky-take-out",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// 新規注文・催促の通知をSSEで配信するエンドポイント
async fn notifications(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("管理コンソールが通知の購読を開始しました");

    let stream = BroadcastStream::new(state.notifier.subscribe()).filter_map(|message| {
        match message {
            Ok(notification) => match Event::default().event("order").json_data(&notification) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::error!(error = %e, "通知のシリアライズに失敗しました");
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "通知の受信が遅れたため一部を破棄しました");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub(crate) fn bad_request(error: impl Into<String>, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

pub(crate) fn invalid_query<E>(_: E) -> (StatusCode, Json<ApiError>) {
    bad_request("無効なクエリパラメータです", "INVALID_PARAMETER")
}

// アプリケーションエラーをHTTPエラーにマッピング
pub(crate) fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, error, code) = match err {
        ApplicationError::DomainError(domain_err) => return map_domain_error(domain_err),
        ApplicationError::RepositoryError(RepositoryError::DuplicateEntry(msg)) => {
            (StatusCode::CONFLICT, format!("既に存在します: {}", msg), "ALREADY_EXISTS")
        }
        ApplicationError::RepositoryError(RepositoryError::Conflict(msg)) => {
            (StatusCode::CONFLICT, msg, "CONFLICT")
        }
        ApplicationError::RepositoryError(repo_err) => {
            tracing::error!(error = %repo_err, "リポジトリ操作に失敗しました");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                repo_err.to_string(),
                "REPOSITORY_ERROR",
            )
        }
        ApplicationError::ShopStatusError(store_err) => {
            tracing::error!(error = %store_err, "営業状態の取得に失敗しました");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                store_err.to_string(),
                "SHOP_STATUS_ERROR",
            )
        }
        ApplicationError::EventPublishingFailed(msg) => {
            tracing::error!(error = %msg, "イベントの発行に失敗しました");
            (StatusCode::INTERNAL_SERVER_ERROR, msg, "EVENT_PUBLISHING_FAILED")
        }
        ApplicationError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
        ApplicationError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
        ApplicationError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg, "ALREADY_EXISTS"),
    };

    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
pub(crate) fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &domain_err {
        DomainError::DeletionNotAllowed(_) => (StatusCode::BAD_REQUEST, "DELETION_NOT_ALLOWED"),
        DomainError::SetmealEnableFailed(_) => (StatusCode::BAD_REQUEST, "SETMEAL_ENABLE_FAILED"),
        DomainError::InvalidOrderState(_) => (StatusCode::BAD_REQUEST, "INVALID_ORDER_STATE"),
        DomainError::InvalidQuantity => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
        DomainError::InvalidValue(_) => (StatusCode::BAD_REQUEST, "INVALID_VALUE"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        DomainError::ShoppingCartEmpty => (StatusCode::BAD_REQUEST, "SHOPPING_CART_EMPTY"),
        DomainError::AddressBookMissing => (StatusCode::BAD_REQUEST, "ADDRESS_BOOK_MISSING"),
        DomainError::ShopClosed => (StatusCode::BAD_REQUEST, "SHOP_CLOSED"),
        DomainError::PasswordMismatch => (StatusCode::UNAUTHORIZED, "PASSWORD_MISMATCH"),
        DomainError::AccountLocked => (StatusCode::FORBIDDEN, "ACCOUNT_LOCKED"),
        DomainError::AmountOverflow => (StatusCode::BAD_REQUEST, "AMOUNT_OVERFLOW"),
        DomainError::NotOnSale(_) => (StatusCode::BAD_REQUEST, "NOT_ON_SALE"),
    };

    let error = match domain_err {
        DomainError::DeletionNotAllowed(msg)
        | DomainError::SetmealEnableFailed(msg)
        | DomainError::InvalidOrderState(msg)
        | DomainError::InvalidValue(msg)
        | DomainError::Validation(msg)
        | DomainError::NotOnSale(msg) => msg,
        DomainError::InvalidQuantity => "無効な数量です".to_string(),
        DomainError::ShoppingCartEmpty => "カートが空です".to_string(),
        DomainError::AddressBookMissing => "配送先住所が見つかりません".to_string(),
        DomainError::ShopClosed => "営業時間外です".to_string(),
        DomainError::PasswordMismatch => "パスワードが違います".to_string(),
        DomainError::AccountLocked => "アカウントがロックされています".to_string(),
        DomainError::AmountOverflow => "金額が上限を超えています".to_string(),
    };

    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use crate::domain::port::ShopStatusError;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "リソースが見つかりません");
    }

    #[test]
    fn test_duplicate_entry_is_conflict() {
        let app_error: ApplicationError =
            RepositoryError::DuplicateEntry("dish.name".to_string()).into();
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "ALREADY_EXISTS");
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        let errors = [
            ApplicationError::RepositoryError(RepositoryError::ConnectionFailed("x".to_string())),
            ApplicationError::ShopStatusError(ShopStatusError::Unavailable("x".to_string())),
            ApplicationError::EventPublishingFailed("x".to_string()),
        ];
        for err in errors {
            let (status, _) = map_application_error(err);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_map_domain_error_codes() {
        let cases = [
            (DomainError::ShopClosed, StatusCode::BAD_REQUEST, "SHOP_CLOSED"),
            (
                DomainError::DeletionNotAllowed("販売中".to_string()),
                StatusCode::BAD_REQUEST,
                "DELETION_NOT_ALLOWED",
            ),
            (DomainError::PasswordMismatch, StatusCode::UNAUTHORIZED, "PASSWORD_MISMATCH"),
            (DomainError::AccountLocked, StatusCode::FORBIDDEN, "ACCOUNT_LOCKED"),
        ];
        for (err, expected_status, expected_code) in cases {
            let (status, Json(api_error)) = map_domain_error(err);
            assert_eq!(status, expected_status);
            assert_eq!(api_error.code, expected_code);
        }
    }

    #[test]
    fn test_domain_message_is_passed_through() {
        let (_, Json(api_error)) =
            map_domain_error(DomainError::Validation("ユーザー名は空にできません".to_string()));
        assert_eq!(api_error.error, "ユーザー名は空にできません");
    }

    #[test]
    fn test_api_error_structure() {
        let api_error = ApiError {
            error: "テストエラー".to_string(),
            code: "TEST_ERROR".to_string(),
        };

        let json = serde_json::to_string(&api_error).unwrap();
        let deserialized: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, "テストエラー");
        assert_eq!(deserialized.code, "TEST_ERROR");
    }
}
