//! Bearer token middleware for protected endpoints.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! caller's [`UserId`] into request extensions for downstream handlers:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use club_pairing::tournament::UserId;
//!
//! async fn protected_handler(Extension(user_id): Extension<UserId>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::logging;

/// Reject requests without a valid bearer token with `401 Unauthorized`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.tokens.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            Ok(next.run(request).await)
        }
        Err(e) => {
            logging::log_security_event(
                "invalid_token",
                None,
                None,
                &format!("{} {}: {}", request.method(), request.uri().path(), e),
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
