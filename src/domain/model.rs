// ドメインモデル（エンティティと値オブジェクト）

mod address_book;
mod dish;
mod employee;
mod order;
mod setmeal;
mod shopping_cart;
mod user;
mod value_objects;

pub use value_objects::{
    AddressBookId, CartItemId, CategoryId, DishId, EmployeeId, OrderId, SetmealId, UserId,
    AuditInfo,
    Money,
    Page, PageRequest,
    ShopStatus,
    Status,
};
pub(crate) use value_objects::ensure_max_chars;

pub use address_book::{AddressBook, AddressDraft};
pub use dish::{Dish, DishDraft, DishFlavor};
pub use employee::{Employee, EmployeeProfile};
pub use order::{Order, OrderDetail, OrderRecord, OrderRequest, OrderStatus, PayMethod, PayStatus};
pub use setmeal::{Setmeal, SetmealDish, SetmealDraft};
pub use shopping_cart::{CartItem, CartProduct, ShoppingCart};
pub use user::User;
