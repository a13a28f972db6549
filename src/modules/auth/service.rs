use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse};
use super::error::AuthError;
use super::model::{User, UserRole};
use super::repository::AuthRepository;
use crate::common::security;
use crate::config::settings::AppConfig;
use crate::migrations::system::{EMAIL_FIELD, PASSWORD_HASH_FIELD, ROLE_FIELD, USERNAME_FIELD};
use crate::modules::records::service::RecordService;
use crate::schema::USERS_COLLECTION_ID;
use crate::state::AppState;
use anyhow::{anyhow, Result};
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use serde_json::{Map, Value};
use tracing::info;

/// Passwords longer than this are cut before hashing and verification.
pub const MAX_PASSWORD_CHARS: usize = 20;

fn clamp_password(password: &str) -> &str {
    match password.char_indices().nth(MAX_PASSWORD_CHARS) {
        Some((end, _)) => &password[..end],
        None => password,
    }
}

pub struct AuthService;

impl AuthService {
    pub async fn register(state: AppState, req: RegisterRequest) -> Result<AuthResponse> {
        let username = req.username.trim().to_string();
        let email = match req.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => username.clone(),
        };

        // Check if user exists
        if AuthRepository::find_user_by_username(state.store.as_ref(), &username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken.into());
        }

        if AuthRepository::find_user_by_email(state.store.as_ref(), &email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken.into());
        }

        // Hash password
        let password_hash = security::hash_password(clamp_password(&req.password))?;

        let users = RecordService::collection(&state, USERS_COLLECTION_ID).await?;
        let mut data = Map::new();
        data.insert(USERNAME_FIELD.into(), Value::String(username));
        data.insert(EMAIL_FIELD.into(), Value::String(email));
        data.insert(PASSWORD_HASH_FIELD.into(), Value::String(password_hash));
        data.insert(ROLE_FIELD.into(), Value::String(UserRole::User.to_string()));
        let record = RecordService::insert_trusted(&state, &users, &data).await?;

        let user = User::from_record(&record);
        info!(user = %user.id, "Registered {}", user.username);
        Self::issue(&state.config, user)
    }

    pub async fn login(state: AppState, req: LoginRequest) -> Result<AuthResponse> {
        let store = state.store.as_ref();
        let user = match AuthRepository::find_user_by_username(store, &req.username).await? {
            Some(user) => Some(user),
            None => AuthRepository::find_user_by_email(store, &req.username).await?,
        }
        .ok_or(AuthError::InvalidCredentials)?;

        // Verify password
        security::verify_password(clamp_password(&req.password), &user.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        info!(user = %user.id, "Login succeeded");
        Self::issue(&state.config, user)
    }

    pub async fn me(state: AppState, user_id: &str) -> Result<UserResponse> {
        let user = AuthRepository::find_user_by_id(state.store.as_ref(), user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    fn issue(config: &AppConfig, user: User) -> Result<AuthResponse> {
        let token = Self::create_access_token(config, &user)?;
        Ok(AuthResponse {
            token,
            expires_in: config.token_ttl_secs,
            user: user.into(),
        })
    }

    pub fn create_access_token(config: &AppConfig, user: &User) -> Result<String> {
        let now = get_current_timestamp() as usize;

        let claims = TokenClaims {
            sub: user.id.clone(),
            role: user.role.to_string(),
            exp: now + config.token_ttl_secs as usize,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow!(e.to_string()))
    }
}
