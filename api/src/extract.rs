use crate::ApiError;
use axum::extract::FromRequest;

/// JSON request body whose rejections are reported as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);
