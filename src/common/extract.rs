// src/common/extract.rs

use axum::{extract::FromRequest, Json};

use crate::common::error::AppError;

/// `Json<T>` cujas rejeições viram `AppError` (400 com `message`).
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
