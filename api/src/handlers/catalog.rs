use crate::{extract::Payload, ApiError, AppState, AuthUser};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use entity::{category, menu_item};
use little_lemon_service::catalog::{self, CategoryInput, MenuItemFilter, MenuItemInput};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<category::Model>>, ApiError> {
    Ok(Json(catalog::list_categories(&state.conn).await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<category::Model>, ApiError> {
    Ok(Json(catalog::get_category(&state.conn, id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    _: AuthUser,
    Payload(input): Payload<CategoryInput>,
) -> Result<(StatusCode, Json<category::Model>), ApiError> {
    let category = catalog::create_category(&state.conn, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<i32>,
    Payload(input): Payload<CategoryInput>,
) -> Result<Json<category::Model>, ApiError> {
    Ok(Json(catalog::update_category(&state.conn, id, input).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    catalog::delete_category(&state.conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(filter): Query<MenuItemFilter>,
) -> Result<Json<Vec<menu_item::Model>>, ApiError> {
    Ok(Json(catalog::list_menu_items(&state.conn, &filter).await?))
}

pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<menu_item::Model>, ApiError> {
    Ok(Json(catalog::get_menu_item(&state.conn, id).await?))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    _: AuthUser,
    Payload(input): Payload<MenuItemInput>,
) -> Result<(StatusCode, Json<menu_item::Model>), ApiError> {
    let item = catalog::create_menu_item(&state.conn, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<i32>,
    Payload(input): Payload<MenuItemInput>,
) -> Result<Json<menu_item::Model>, ApiError> {
    Ok(Json(catalog::update_menu_item(&state.conn, id, input).await?))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    catalog::delete_menu_item(&state.conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
