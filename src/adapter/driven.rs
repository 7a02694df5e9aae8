// 駆動される側アダプター（リポジトリ実装など）

mod address_book_repository;
mod dish_repository;
mod employee_repository;
mod event_bus;
mod in_memory_repository;
mod order_repository;
mod password_hasher;
mod setmeal_repository;
mod shop_notifier;
mod shop_status_store;
mod shopping_cart_repository;
mod user_repository;

pub use address_book_repository::MySqlAddressBookRepository;
pub use dish_repository::MySqlDishRepository;
pub use employee_repository::MySqlEmployeeRepository;
pub use event_bus::{DeadLetterEntry, EventBusConfig, FailedEventProcessing, InMemoryEventBus};
pub use in_memory_repository::{
    InMemoryAddressBookRepository, InMemoryDishRepository, InMemoryEmployeeRepository,
    InMemoryOrderRepository, InMemorySetmealRepository, InMemoryShoppingCartRepository,
    InMemoryUserRepository,
};
pub use order_repository::MySqlOrderRepository;
pub use password_hasher::Sha256PasswordHasher;
pub use setmeal_repository::MySqlSetmealRepository;
pub use shop_notifier::BroadcastShopNotifier;
pub use shop_status_store::InMemoryShopStatusStore;
pub use shopping_cart_repository::MySqlShoppingCartRepository;
pub use user_repository::MySqlUserRepository;
