pub mod account;
pub mod cart;
pub mod catalog;
pub mod group;
pub mod order;

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
