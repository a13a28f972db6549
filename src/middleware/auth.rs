use crate::common::response::ApiError;
use crate::modules::auth::AUTH_COOKIE;
use crate::modules::auth::dto::TokenClaims;
use crate::modules::auth::model::User;
use crate::rules::AuthContext;
use crate::schema::USERS_COLLECTION_ID;
use crate::state::AppState;
use axum::{
    extract::{Extension, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tower_cookies::Cookies;
use tracing::{debug, error};

/// Resolves the caller into an [`AuthContext`] extension. Requests without
/// credentials continue as guests; a token that is present but invalid is
/// rejected.
pub async fn auth_context(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Bearer header first, then the auth cookie
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .or_else(|| cookies.get(AUTH_COOKIE).map(|c| c.value().to_owned()))
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        req.extensions_mut().insert(AuthContext::Guest);
        return Ok(next.run(req).await);
    };

    // 2. Verify JWT
    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError("Unauthorized: Invalid or expired token".to_string(), StatusCode::UNAUTHORIZED)
    })?
    .claims;

    // 3. The user must still exist; the role comes from the stored record
    let record = state
        .store
        .find_record(USERS_COLLECTION_ID, &claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.sub, e);
            ApiError("Internal Server Error".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        })?
        .ok_or_else(|| ApiError("Unauthorized: Unknown user".to_string(), StatusCode::UNAUTHORIZED))?;

    // 4. Inject the caller into request extensions
    req.extensions_mut().insert(User::from_record(&record).auth_context());

    Ok(next.run(req).await)
}

/// Rejects guests. Must run inside [`auth_context`].
pub async fn require_auth(
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.is_guest() {
        return Err(ApiError("Unauthorized: Authentication required".to_string(), StatusCode::UNAUTHORIZED));
    }

    Ok(next.run(req).await)
}
