use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use jsonwebtoken::{decode, encode, get_current_timestamp, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::adapter::driver::rest_api::ApiError;
use crate::domain::model::{EmployeeId, UserId};

/// 管理コンソールのトークンを運ぶヘッダー
pub const ADMIN_TOKEN_HEADER: &str = "token";
/// 顧客アプリのトークンを運ぶヘッダー
pub const USER_TOKEN_HEADER: &str = "authentication";

/// トークンのペイロード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 従業員IDまたは顧客ID
    pub sub: String,
    /// 有効期限（UNIX秒）
    pub exp: u64,
}

/// 認証エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("Token is missing")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token issue failed: {0}")]
    IssueFailed(String),
}

/// HS256のトークン発行・検証鍵
/// 従業員用と顧客用で別の鍵を使う
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// トークンを発行
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: get_current_timestamp() + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::IssueFailed(e.to_string()))
    }

    /// トークンを検証してペイロードを取り出す
    /// 署名不一致・期限切れは `InvalidToken`
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// ログイン中の従業員（管理コンソールのリクエストに付与される）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentEmployee(pub EmployeeId);

/// ログイン中の顧客（顧客アプリのリクエストに付与される）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

fn bearer<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

fn unauthorized(err: AuthError) -> (StatusCode, Json<ApiError>) {
    tracing::debug!(error = %err, "認証に失敗しました");
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError {
            error: "ログインしてください".to_string(),
            code: "UNAUTHORIZED".to_string(),
        }),
    )
}

/// 管理コンソール用の認証ミドルウェア
/// `token` ヘッダーの従業員トークンを検証し、`CurrentEmployee` をリクエストに付与する
pub async fn require_employee(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let claims = bearer(request.headers(), ADMIN_TOKEN_HEADER)
        .and_then(|token| keys.verify(token))
        .map_err(unauthorized)?;
    let employee_id = EmployeeId::from_string(&claims.sub)
        .map_err(|e| unauthorized(AuthError::InvalidToken(e.to_string())))?;

    request.extensions_mut().insert(CurrentEmployee(employee_id));
    Ok(next.run(request).await)
}

/// 顧客アプリ用の認証ミドルウェア
/// `authentication` ヘッダーの顧客トークンを検証し、`CurrentUser` をリクエストに付与する
pub async fn require_user(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let claims = bearer(request.headers(), USER_TOKEN_HEADER)
        .and_then(|token| keys.verify(token))
        .map_err(unauthorized)?;
    let user_id = UserId::from_string(&claims.sub)
        .map_err(|e| unauthorized(AuthError::InvalidToken(e.to_string())))?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}
