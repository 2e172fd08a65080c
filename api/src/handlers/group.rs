use crate::{extract::Payload, ApiError, AppState, AuthUser};
use axum::{
    extract::{Path, State},
    Json,
};
use entity::user;
use little_lemon_service::group::{self as groups, Assignment, GroupKind, Membership};
use serde_json::{json, Value};

pub async fn members(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(kind): Path<GroupKind>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(groups::members(&state.conn, &caller, kind).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(kind): Path<GroupKind>,
    Payload(membership): Payload<Membership>,
) -> Result<Json<Value>, ApiError> {
    groups::add_member(&state.conn, &caller, kind, &membership).await?;
    Ok(message(format!("user added to the {} group", label(kind))))
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(kind): Path<GroupKind>,
    Payload(membership): Payload<Membership>,
) -> Result<Json<Value>, ApiError> {
    groups::remove_member(&state.conn, &caller, kind, &membership).await?;
    Ok(message(format!("user removed from the {} group", label(kind))))
}

pub async fn assign(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<i32>,
    Payload(assignment): Payload<Assignment>,
) -> Result<Json<Value>, ApiError> {
    groups::assign(&state.conn, &caller, user_id, &assignment).await?;
    Ok(Json(json!({ "status": "user added to group" })))
}

fn label(kind: GroupKind) -> String {
    kind.name().to_lowercase()
}

fn message(text: String) -> Json<Value> {
    Json(json!({ "message": text }))
}
