//! API request handlers
//!
//! Author: hephaex@gmail.com

pub mod admin;
pub mod auth;
pub mod health;

use crate::error::AppError;
use axum::{extract::FromRequest, http::Uri};

/// JSON body extractor whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {} on this server", uri.path()))
}
