// ドメイン層
// ビジネスルールと外部依存を抽象化したポートを定義する

pub mod error;
pub mod event;
pub mod event_bus;
pub mod handler;
pub mod model;
pub mod port;
pub mod service;
