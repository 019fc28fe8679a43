//! Development-only fault details
//!
//! [`AppError::Internal`](crate::error::AppError) responses carry their detail
//! in a response extension. In development this layer copies it into the body
//! as `stack`; in production the extension is dropped unseen.

use crate::error::{ApiError, InternalDetail, INTERNAL_MESSAGE};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_core::Environment;

pub async fn expose_error_details(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !environment.is_development() {
        return response;
    }

    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned()
    else {
        return response;
    };

    let status = response.status();
    (
        status,
        Json(ApiError::new(status, INTERNAL_MESSAGE).with_stack(detail)),
    )
        .into_response()
}
