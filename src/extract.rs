use crate::errors::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// `Json` body whose rejections use the `{status:"fail"}` error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` string with the same error body as [`AppJson`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
