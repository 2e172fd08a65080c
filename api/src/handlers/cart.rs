use crate::{extract::Payload, ApiError, AppState, AuthUser};
use axum::{extract::State, http::StatusCode, Json};
use entity::cart;
use little_lemon_service::cart::{self as carts, CartAddition};

pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<cart::Model>>, ApiError> {
    Ok(Json(carts::list(&state.conn, &caller).await?))
}

pub async fn add(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Payload(addition): Payload<CartAddition>,
) -> Result<(StatusCode, Json<cart::Model>), ApiError> {
    let row = carts::add(&state.conn, &caller, addition).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn clear(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<&'static str>, ApiError> {
    carts::clear(&state.conn, &caller).await?;
    Ok(Json("ok"))
}
