//! Authentication middleware: resolves the bearer API key into an [`Identity`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use wallet_types::{AppError, IdentityProvider, MarketRepository};

use super::handlers::{ApiError, AppState};
use crate::access::Identity;

/// Extracts the API key from the Authorization header.
/// Expected format: "Bearer <api_key>" or just "<api_key>"
fn extract_api_key(auth_header: &str) -> &str {
    auth_header
        .strip_prefix("Bearer ")
        .unwrap_or(auth_header)
        .trim()
}

/// Authentication middleware.
///
/// - No `Authorization` header: the request continues as anonymous and the
///   access checks in the service decide.
/// - A header that does not resolve to an active key: 401.
/// - A key belonging to a disabled user: 403.
///
/// The resolved [`Identity`] is stored as a request extension.
pub async fn auth_middleware<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let identity = match request.headers().get(AUTHORIZATION) {
        None => Identity::anonymous(),
        Some(value) => {
            let api_key = match value.to_str() {
                Ok(header) => extract_api_key(header),
                Err(_) => return ApiError(AppError::Unauthenticated).into_response(),
            };

            if api_key.is_empty() {
                return ApiError(AppError::Unauthenticated).into_response();
            }

            match state.service.authenticate(api_key).await {
                Ok(user_id) => Identity::user(user_id),
                Err(err) => {
                    tracing::debug!(error = %err, "API key rejected");
                    return ApiError(err).into_response();
                }
            }
        }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}
