// 顧客アプリ向けのエンドポイント
// ログインと営業状態の参照以外は `CurrentUser` が付与されたリクエストだけが届く

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::adapter::driver::auth::CurrentUser;
use crate::adapter::driver::request_dto::{
    AddressRequest, CartRequest, CategoryQuery, IdQuery, IdRequest, OrderPageQuery,
    OrderSubmitRequest, PaymentRequest, UserLoginRequest,
};
use crate::adapter::driver::response_dto::{
    AddressResponse, CartItemResponse, DishItemResponse, DishResponse, IdResponse,
    OrderResponse, OrderSubmitResponse, PageResponse, SetmealResponse, UserLoginResponse,
};
use crate::adapter::driver::rest_api::{
    bad_request, invalid_query, map_application_error, map_domain_error, ApiError, ApiResult,
    AppState,
};
use crate::domain::model::{AddressBookId, CategoryId, OrderId, SetmealId};

// 顧客ログインエンドポイント
// 初回ログイン時は顧客を登録する
pub async fn user_login(
    State(state): State<AppState>,
    Json(request): Json<UserLoginRequest>,
) -> ApiResult<Json<UserLoginResponse>> {
    let user = state
        .user_service
        .login(&request.openid)
        .await
        .map_err(map_application_error)?;

    match state.user_keys.issue(&user.id().to_string()) {
        Ok(token) => Ok(Json(UserLoginResponse::new(&user, token))),
        Err(e) => {
            tracing::error!(error = %e, "トークンの発行に失敗しました");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: e.to_string(),
                    code: "TOKEN_ISSUE_FAILED".to_string(),
                }),
            ))
        }
    }
}

// 営業状態の参照エンドポイント
pub async fn get_shop_status(State(state): State<AppState>) -> ApiResult<Json<i32>> {
    let status = state
        .shop_service
        .get_status()
        .await
        .map_err(map_application_error)?;
    Ok(Json(status.code()))
}

// 分類ごとの販売中菜品（味付けを含む）
pub async fn dish_list(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<DishResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let dishes = state
        .dish_service
        .list_by_category(CategoryId::from_uuid(params.category_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(dishes.iter().map(DishResponse::from_dish).collect()))
}

// 分類ごとの販売中セットメニュー
pub async fn setmeal_list(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SetmealResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let setmeals = state
        .setmeal_service
        .list_by_category(CategoryId::from_uuid(params.category_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(setmeals.iter().map(SetmealResponse::from_setmeal).collect()))
}

// セットメニューに含まれる菜品
pub async fn setmeal_dishes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<DishItemResponse>>> {
    let items = state
        .setmeal_service
        .dish_items(SetmealId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(items.into_iter().map(DishItemResponse::from).collect()))
}

// カートに追加するエンドポイント
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CartRequest>,
) -> ApiResult<StatusCode> {
    let product = request.into_product().map_err(map_domain_error)?;
    state
        .shopping_cart_service
        .add(user_id, product)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// カートから一つ減らすエンドポイント
pub async fn sub_from_cart(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CartRequest>,
) -> ApiResult<StatusCode> {
    let product = request.into_product().map_err(map_domain_error)?;
    state
        .shopping_cart_service
        .sub(user_id, product)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// カートの内容
pub async fn list_cart(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<CartItemResponse>>> {
    let cart = state
        .shopping_cart_service
        .list(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(cart.items().iter().map(CartItemResponse::from_item).collect()))
}

// カートを空にするエンドポイント
pub async fn clean_cart(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<StatusCode> {
    state
        .shopping_cart_service
        .clean(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 住所登録エンドポイント
pub async fn add_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<AddressRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let id = state
        .address_book_service
        .add(user_id, request.into_draft())
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(id))))
}

// 住所更新エンドポイント
pub async fn update_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<AddressRequest>,
) -> ApiResult<StatusCode> {
    let id = request
        .id
        .map(AddressBookId::from_uuid)
        .ok_or_else(|| bad_request("IDを指定してください", "MISSING_ID"))?;
    state
        .address_book_service
        .update(user_id, id, request.into_draft())
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 住所削除エンドポイント
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    state
        .address_book_service
        .delete(user_id, AddressBookId::from_uuid(params.id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 住所一覧
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<AddressResponse>>> {
    let addresses = state
        .address_book_service
        .list(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(addresses.iter().map(AddressResponse::from_address).collect()))
}

// デフォルトの住所
pub async fn default_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<AddressResponse>> {
    let address = state
        .address_book_service
        .get_default(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(AddressResponse::from_address(&address)))
}

// デフォルトの住所を設定するエンドポイント
pub async fn set_default_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<IdRequest>,
) -> ApiResult<StatusCode> {
    state
        .address_book_service
        .set_default(user_id, AddressBookId::from_uuid(request.id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 住所詳細
pub async fn get_address(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddressResponse>> {
    let address = state
        .address_book_service
        .get(user_id, AddressBookId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(AddressResponse::from_address(&address)))
}

// 注文確定エンドポイント
pub async fn submit_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<OrderSubmitRequest>,
) -> ApiResult<(StatusCode, Json<OrderSubmitResponse>)> {
    let request = request.into_request().map_err(map_domain_error)?;
    let submitted = state
        .order_service
        .submit_order(user_id, request)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(submitted.into())))
}

// 支払い完了通知エンドポイント
// 決済サービスからのコールバックの代わりに顧客アプリから呼ばれる
pub async fn pay_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<StatusCode> {
    tracing::info!(user_id = %user_id, number = %request.order_number, "支払い完了通知を受信しました");
    state
        .order_service
        .pay_success(&request.order_number)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 注文履歴
pub async fn order_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    query: Result<Query<OrderPageQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<OrderResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let status = params.status().map_err(map_domain_error)?;
    let page = state
        .order_query_service
        .history(user_id, status, params.page_request())
        .await
        .map_err(map_application_error)?;
    Ok(Json(PageResponse::from_page(page, OrderResponse::from_order)))
}

// 注文詳細
pub async fn order_detail(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .order_query_service
        .get_user_order(user_id, OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderResponse::from_order(&order)))
}

// 顧客による注文取り消しエンドポイント
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .cancel_by_customer(user_id, OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// もう一度注文（過去の注文内容をカートに戻す）
pub async fn repeat_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .repeat(user_id, OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 催促エンドポイント
pub async fn remind_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .remind(Some(user_id), OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}
