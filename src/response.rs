//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessData<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessMessage {
    pub success: bool,
    pub message: String,
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessData<T>>) {
    (
        StatusCode::OK,
        Json(SuccessData {
            success: true,
            data,
        }),
    )
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<SuccessData<T>>) {
    (
        StatusCode::CREATED,
        Json(SuccessData {
            success: true,
            data,
        }),
    )
}

pub fn message(msg: impl Into<String>) -> (StatusCode, Json<SuccessMessage>) {
    (
        StatusCode::OK,
        Json(SuccessMessage {
            success: true,
            message: msg.into(),
        }),
    )
}
