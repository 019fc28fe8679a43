//! API error handling
//!
//! Every failure leaving a handler or middleware is an [`AppError`]; this is
//! the single place where errors become an HTTP status and a JSON body.
//!
//! Author: hephaex@gmail.com

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_core::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::password::PasswordError;

/// Message returned for every unexpected fault
pub const INTERNAL_MESSAGE: &str = "Something went wrong";

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// "fail" for client errors, "error" for server faults
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Internal fault detail, only present in development mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let label = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };
        Self {
            status: label.to_string(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Internal fault detail carried on a 500 response for the error-detail layer
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                let mut response =
                    (status, Json(ApiError::new(status, INTERNAL_MESSAGE))).into_response();
                response.extensions_mut().insert(InternalDetail(detail));
                response
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => (status, Json(ApiError::new(status, msg))).into_response(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                AppError::Conflict(crate::auth::service::DUPLICATE_EMAIL.to_string())
            }
            StoreError::Timeout(_) | StoreError::Database(_) | StoreError::CorruptRecord(_) => {
                AppError::Internal(format!("Credential store: {err}"))
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
