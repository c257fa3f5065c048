//! JSON extractor whose rejections render as [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// Like `axum::Json`, but a malformed or mistyped body becomes
/// `AppError::InvalidJson` with the API's error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
