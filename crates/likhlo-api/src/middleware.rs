use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::token;

/// Extract and validate the bearer token, then hand the verified `Claims`
/// to downstream handlers through the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Forbidden("Access Denied: Missing or Invalid Token".into()))?;

    let claims = token::verify(token, &state.jwt_secret).map_err(|e| {
        debug!("Rejected token on {}: {}", req.uri().path(), e);
        ApiError::Forbidden("Invalid Token".into())
    })?;

    if claims.id.is_nil() {
        warn!("Token verified but carries a nil user id");
        return Err(ApiError::Forbidden("Access Denied".into()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
