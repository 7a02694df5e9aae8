// ドライバーアダプター
// HTTPリクエストをアプリケーションサービスの呼び出しに変換する

pub mod admin_api;
pub mod auth;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;
pub mod user_api;

pub use auth::{CurrentEmployee, CurrentUser, JwtKeys, ADMIN_TOKEN_HEADER, USER_TOKEN_HEADER};
pub use rest_api::{create_router, ApiError, AppState, Ports};
