// アプリケーション層
// ユースケースごとにリポジトリとドメインモデルを組み合わせる

pub mod error;
pub mod service;

pub use error::ApplicationError;
