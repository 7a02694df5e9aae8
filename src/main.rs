use sky_take_out::adapter::driven::{
    BroadcastShopNotifier, EventBusConfig, InMemoryEventBus, InMemoryShopStatusStore,
    MySqlAddressBookRepository, MySqlDishRepository, MySqlEmployeeRepository, MySqlOrderRepository,
    MySqlSetmealRepository, MySqlShoppingCartRepository, MySqlUserRepository,
    Sha256PasswordHasher,
};
use sky_take_out::adapter::driver::{create_router, AppState, JwtKeys, Ports};
use sky_take_out::adapter::{AppConfig, DatabaseConfig, DatabaseMigration};
use sky_take_out::application::service::OrderTimeoutService;
use sky_take_out::domain::handler::ShopNotificationHandler;
use sky_take_out::domain::model::Order;

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DatabaseConfig::from_env()?;
    let app_config = AppConfig::from_env()?;
    tracing::info!(host = %config.host, port = config.port, "データベース設定を読み込みました");

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;

    DatabaseMigration::new(pool.clone()).run().await?;

    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));

    // 支払い完了・催促を管理コンソールへ通知する
    let notifier = BroadcastShopNotifier::default();
    let event_bus = Arc::new(InMemoryEventBus::new(EventBusConfig::default()));
    let shared_notifier = Arc::new(notifier.clone());
    event_bus
        .subscribe_order_paid(ShopNotificationHandler::new(shared_notifier.clone()))
        .await?;
    event_bus
        .subscribe_order_reminded(ShopNotificationHandler::new(shared_notifier))
        .await?;

    let ports = Ports {
        employee_repository: Arc::new(MySqlEmployeeRepository::new(pool.clone())),
        dish_repository: Arc::new(MySqlDishRepository::new(pool.clone())),
        setmeal_repository: Arc::new(MySqlSetmealRepository::new(pool.clone())),
        user_repository: Arc::new(MySqlUserRepository::new(pool.clone())),
        address_book_repository: Arc::new(MySqlAddressBookRepository::new(pool.clone())),
        shopping_cart_repository: Arc::new(MySqlShoppingCartRepository::new(pool.clone())),
        order_repository: order_repository.clone(),
        shop_status_store: Arc::new(InMemoryShopStatusStore::new()),
        password_hasher: Arc::new(Sha256PasswordHasher),
        event_bus,
    };

    let app_state = AppState::new(
        ports,
        notifier,
        JwtKeys::new(&app_config.jwt_admin_secret, app_config.jwt_ttl_seconds),
        JwtKeys::new(&app_config.jwt_user_secret, app_config.jwt_ttl_seconds),
    );

    // 期限切れ注文の巡回
    let timeout_service = Arc::new(OrderTimeoutService::new(
        order_repository,
        chrono::Duration::minutes(app_config.order_timeout_minutes),
        chrono::Duration::minutes(Order::DELIVERY_TIMEOUT_MINUTES),
    ));
    timeout_service.spawn(std::time::Duration::from_secs(app_config.sweep_interval_seconds));

    let app = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let address = format!("0.0.0.0:{}", app_config.server_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
