use crate::{extract::Payload, ApiError, AppState, AuthUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use little_lemon_service::order::{self as orders, OrderDetail, OrderUpdate, Placement};
use serde_json::json;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<OrderDetail>>, ApiError> {
    Ok(Json(orders::list(&state.conn, &caller).await?))
}

/// An empty cart is answered with a 200 message, not an error
pub async fn place(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Response, ApiError> {
    let response = match orders::place(&state.conn, &caller).await? {
        Placement::Placed(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Placement::EmptyCart => {
            Json(json!({ "message": orders::EMPTY_CART_MESSAGE })).into_response()
        }
    };

    Ok(response)
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>, ApiError> {
    Ok(Json(orders::get(&state.conn, &caller, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i32>,
    Payload(update): Payload<OrderUpdate>,
) -> Result<Json<OrderDetail>, ApiError> {
    Ok(Json(orders::update(&state.conn, &caller, id, update).await?))
}
