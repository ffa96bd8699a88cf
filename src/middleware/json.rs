use axum::extract::FromRequest;

use crate::error::AppError;

// `axum::Json` with its rejection turned into `AppError::BadRequest`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
