use crate::{extract::Payload, ApiError, AppState, AuthUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use entity::user;
use little_lemon_service::{
    account::{self, Credentials, Registration, UserUpdate},
    Caller,
};
use serde_json::{json, Value};

pub async fn register(
    State(state): State<AppState>,
    Payload(registration): Payload<Registration>,
) -> Result<(StatusCode, Json<user::Model>), ApiError> {
    let user = account::register(&state.conn, registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(AuthUser(caller): AuthUser) -> Json<Caller> {
    Json(caller)
}

pub async fn login(
    State(state): State<AppState>,
    Payload(credentials): Payload<Credentials>,
) -> Result<Json<Value>, ApiError> {
    let key = account::login(&state.conn, &credentials).await?;
    Ok(Json(json!({ "auth_token": key })))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<StatusCode, ApiError> {
    account::logout(&state.conn, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(account::list_users(&state.conn, &caller).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Payload(registration): Payload<Registration>,
) -> Result<(StatusCode, Json<user::Model>), ApiError> {
    let user = account::create_user_as_admin(&state.conn, &caller, registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<user::Model>, ApiError> {
    Ok(Json(account::get_user(&state.conn, &caller, id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i32>,
    Payload(update): Payload<UserUpdate>,
) -> Result<Json<user::Model>, ApiError> {
    Ok(Json(account::update_user(&state.conn, &caller, id, update).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    account::delete_user(&state.conn, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
