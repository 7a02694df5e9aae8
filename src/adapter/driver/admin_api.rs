// 管理コンソール向けのエンドポイント
// ログイン以外は `CurrentEmployee` が付与されたリクエストだけが届く

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::adapter::driver::auth::CurrentEmployee;
use crate::adapter::driver::request_dto::{
    CancelRequest, CategoryQuery, DishRequest, EmployeeLoginRequest, EmployeePageQuery,
    EmployeeRequest, IdQuery, IdRequest, IdsQuery, MenuPageQuery, OrderPageQuery,
    RejectionRequest, ReportQuery, SetmealRequest,
};
use crate::adapter::driver::response_dto::{
    DishResponse, EmployeeLoginResponse, EmployeeResponse, IdResponse, OrderReportResponse,
    OrderResponse, OrderStatisticsResponse, PageResponse, SalesTopResponse, SetmealResponse,
    TurnoverReportResponse,
};
use crate::adapter::driver::rest_api::{
    bad_request, invalid_query, map_application_error, map_domain_error, ApiError, ApiResult,
    AppState,
};
use crate::domain::model::{
    CategoryId, DishId, EmployeeId, OrderId, SetmealId, ShopStatus, Status,
};

fn require_id(id: Option<Uuid>) -> ApiResult<Uuid> {
    id.ok_or_else(|| bad_request("IDを指定してください", "MISSING_ID"))
}

fn parse_status(code: i32) -> ApiResult<Status> {
    Status::from_code(code).map_err(map_domain_error)
}

// 従業員ログインエンドポイント
pub async fn employee_login(
    State(state): State<AppState>,
    Json(request): Json<EmployeeLoginRequest>,
) -> ApiResult<Json<EmployeeLoginResponse>> {
    let employee = state
        .employee_service
        .login(&request.username, &request.password)
        .await
        .map_err(map_application_error)?;

    let token = state.admin_keys.issue(&employee.id().to_string()).map_err(|e| {
        tracing::error!(error = %e, "トークンの発行に失敗しました");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: e.to_string(),
                code: "TOKEN_ISSUE_FAILED".to_string(),
            }),
        )
    })?;

    Ok(Json(EmployeeLoginResponse {
        id: employee.id().to_string(),
        user_name: employee.username().to_string(),
        name: employee.name().to_string(),
        token,
    }))
}

// ログアウト（トークンはクライアント側で破棄する）
pub async fn employee_logout(Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>) -> StatusCode {
    tracing::info!(employee_id = %actor, "従業員がログアウトしました");
    StatusCode::OK
}

// 従業員登録エンドポイント
pub async fn save_employee(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<EmployeeRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    match state
        .employee_service
        .create_employee(request.into_profile(), Some(actor))
        .await
    {
        Ok(id) => Ok((StatusCode::CREATED, Json(IdResponse::new(id)))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 従業員更新エンドポイント
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<EmployeeRequest>,
) -> ApiResult<StatusCode> {
    let id = EmployeeId::from_uuid(require_id(request.id)?);
    state
        .employee_service
        .update_employee(id, request.into_profile(), Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 従業員一覧エンドポイント
pub async fn employee_page(
    State(state): State<AppState>,
    query: Result<Query<EmployeePageQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<EmployeeResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let page = state
        .employee_service
        .page_query(params.name.as_deref(), params.page_request())
        .await
        .map_err(map_application_error)?;
    Ok(Json(PageResponse::from_page(page, EmployeeResponse::from_employee)))
}

// 従業員の有効・ロック切り替えエンドポイント
pub async fn employee_status(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Path(status): Path<i32>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    let status = parse_status(status)?;
    state
        .employee_service
        .change_status(EmployeeId::from_uuid(params.id), status, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 従業員詳細エンドポイント
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EmployeeResponse>> {
    let employee = state
        .employee_service
        .get_by_id(EmployeeId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(EmployeeResponse::from_employee(&employee)))
}

// 菜品登録エンドポイント
pub async fn save_dish(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<DishRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let status = request.initial_status().map_err(map_domain_error)?;
    let draft = request.into_draft().map_err(map_domain_error)?;
    let id = state
        .dish_service
        .create_dish(draft, status, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(id))))
}

// 菜品更新エンドポイント（味付けは丸ごと置き換える）
pub async fn update_dish(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<DishRequest>,
) -> ApiResult<StatusCode> {
    let id = DishId::from_uuid(require_id(request.id)?);
    let draft = request.into_draft().map_err(map_domain_error)?;
    state
        .dish_service
        .update_dish(id, draft, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 菜品一括削除エンドポイント
pub async fn delete_dishes(
    State(state): State<AppState>,
    query: Result<Query<IdsQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    let ids: Vec<DishId> = params
        .parse()
        .map_err(map_domain_error)?
        .into_iter()
        .map(DishId::from_uuid)
        .collect();
    state
        .dish_service
        .delete_dishes(&ids)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 菜品一覧エンドポイント
pub async fn dish_page(
    State(state): State<AppState>,
    query: Result<Query<MenuPageQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<DishResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let menu = params.to_query().map_err(map_domain_error)?;
    let page = state
        .dish_service
        .page_query(&menu, params.page_request())
        .await
        .map_err(map_application_error)?;
    Ok(Json(PageResponse::from_page(page, DishResponse::from_dish)))
}

// 分類ごとの販売中菜品（セットメニュー編集画面用）
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

// 菜品の販売開始・停止エンドポイント
pub async fn dish_status(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Path(status): Path<i32>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    let status = parse_status(status)?;
    state
        .dish_service
        .change_status(DishId::from_uuid(params.id), status, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 菜品詳細エンドポイント（味付けを含む）
pub async fn get_dish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DishResponse>> {
    let dish = state
        .dish_service
        .get_dish(DishId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(DishResponse::from_dish(&dish)))
}

// セットメニュー登録エンドポイント
pub async fn save_setmeal(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<SetmealRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let status = request.initial_status().map_err(map_domain_error)?;
    let draft = request.into_draft().map_err(map_domain_error)?;
    let id = state
        .setmeal_service
        .create_setmeal(draft, status, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(id))))
}

// セットメニュー更新エンドポイント（菜品の関連は丸ごと置き換える）
pub async fn update_setmeal(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Json(request): Json<SetmealRequest>,
) -> ApiResult<StatusCode> {
    let id = SetmealId::from_uuid(require_id(request.id)?);
    let draft = request.into_draft().map_err(map_domain_error)?;
    state
        .setmeal_service
        .update_setmeal(id, draft, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// セットメニュー一括削除エンドポイント
pub async fn delete_setmeals(
    State(state): State<AppState>,
    query: Result<Query<IdsQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    let ids: Vec<SetmealId> = params
        .parse()
        .map_err(map_domain_error)?
        .into_iter()
        .map(SetmealId::from_uuid)
        .collect();
    state
        .setmeal_service
        .delete_setmeals(&ids)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// セットメニュー一覧エンドポイント
pub async fn setmeal_page(
    State(state): State<AppState>,
    query: Result<Query<MenuPageQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<SetmealResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let menu = params.to_query().map_err(map_domain_error)?;
    let page = state
        .setmeal_service
        .page_query(&menu, params.page_request())
        .await
        .map_err(map_application_error)?;
    Ok(Json(PageResponse::from_page(page, SetmealResponse::from_setmeal)))
}

// セットメニューの販売開始・停止エンドポイント
pub async fn setmeal_status(
    State(state): State<AppState>,
    Extension(CurrentEmployee(actor)): Extension<CurrentEmployee>,
    Path(status): Path<i32>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(params) = query.map_err(invalid_query)?;
    let status = parse_status(status)?;
    state
        .setmeal_service
        .change_status(SetmealId::from_uuid(params.id), status, Some(actor))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// セットメニュー詳細エンドポイント
pub async fn get_setmeal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SetmealResponse>> {
    let setmeal = state
        .setmeal_service
        .get_setmeal(SetmealId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(SetmealResponse::from_setmeal(&setmeal)))
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

// 営業状態の変更エンドポイント
pub async fn set_shop_status(
    State(state): State<AppState>,
    Path(status): Path<i32>,
) -> ApiResult<StatusCode> {
    let status = ShopStatus::from_code(status).map_err(map_domain_error)?;
    state
        .shop_service
        .set_status(status)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 注文検索エンドポイント
pub async fn order_search(
    State(state): State<AppState>,
    query: Result<Query<OrderPageQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<OrderResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;
    let status = params.status().map_err(map_domain_error)?;
    let page = state
        .order_query_service
        .condition_search(status, params.number.clone(), params.page_request())
        .await
        .map_err(map_application_error)?;
    Ok(Json(PageResponse::from_page(page, OrderResponse::from_order)))
}

// 対応待ち注文件数エンドポイント
pub async fn order_statistics(
    State(state): State<AppState>,
) -> ApiResult<Json<OrderStatisticsResponse>> {
    let stats = state
        .order_query_service
        .statistics()
        .await
        .map_err(map_application_error)?;
    Ok(Json(stats.into()))
}

// 日別売上エンドポイント
pub async fn turnover_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Json<TurnoverReportResponse>> {
    let Query(params) = query.map_err(invalid_query)?;
    let report = state
        .report_service
        .turnover(params.begin, params.end)
        .await
        .map_err(map_application_error)?;
    Ok(Json(report.into()))
}

// 日別注文件数エンドポイント
pub async fn order_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Json<OrderReportResponse>> {
    let Query(params) = query.map_err(invalid_query)?;
    let report = state
        .report_service
        .orders(params.begin, params.end)
        .await
        .map_err(map_application_error)?;
    Ok(Json(report.into()))
}

// 販売数量トップ10エンドポイント
pub async fn sales_top10(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Json<SalesTopResponse>> {
    let Query(params) = query.map_err(invalid_query)?;
    let ranks = state
        .report_service
        .top10(params.begin, params.end)
        .await
        .map_err(map_application_error)?;
    Ok(Json(ranks.into()))
}

// 注文詳細エンドポイント
pub async fn order_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .order_query_service
        .get_order(OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderResponse::from_order(&order)))
}

// 注文受付エンドポイント
pub async fn confirm_order(
    State(state): State<AppState>,
    Json(request): Json<IdRequest>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .confirm(OrderId::from_uuid(request.id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 注文拒否エンドポイント
pub async fn reject_order(
    State(state): State<AppState>,
    Json(request): Json<RejectionRequest>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .reject(OrderId::from_uuid(request.id), request.rejection_reason)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 店舗側の注文キャンセルエンドポイント
pub async fn cancel_order(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .cancel(OrderId::from_uuid(request.id), request.cancel_reason)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 配達開始エンドポイント
pub async fn deliver_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .deliver(OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}

// 配達完了エンドポイント
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .complete(OrderId::from_uuid(id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::OK)
}
