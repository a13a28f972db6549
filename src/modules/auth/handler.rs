use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use super::error::api_error;
use super::service::AuthService;
use super::AUTH_COOKIE;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::config::settings::AppConfig;
use crate::rules::AuthContext;
use crate::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use validator::Validate;

fn auth_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(config.cookie_secure);
    cookie.set_max_age(Some(time::Duration::seconds(config.token_ttl_secs as i64)));
    cookie
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    let config = state.config.clone();
    match AuthService::register(state, payload).await {
        Ok(response) => {
            cookies.add(auth_cookie(&config, response.token.clone()));
            ApiSuccess(ApiResponse::success(response, "User registered successfully"), StatusCode::CREATED).into_response()
        }
        Err(e) => api_error(e).into_response(),
    }
}

/// Login with username or email
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid credentials"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    let config = state.config.clone();
    match AuthService::login(state, payload).await {
        Ok(response) => {
            cookies.add(auth_cookie(&config, response.token.clone()));
            ApiSuccess(ApiResponse::success(response, "Login successful"), StatusCode::OK).into_response()
        }
        Err(e) => api_error(e).into_response(),
    }
}

/// Logout user
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = ApiResponse<String>)
    ),
    tag = "Auth"
)]
pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);

    ApiSuccess(ApiResponse::success((), "Logged out successfully"), StatusCode::OK).into_response()
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> impl IntoResponse {
    let Some(id) = auth.id() else {
        return ApiError("Unauthorized: Authentication required".to_string(), StatusCode::UNAUTHORIZED).into_response();
    };

    match AuthService::me(state, id).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "User retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => api_error(e).into_response(),
    }
}
