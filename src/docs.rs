use utoipa::OpenApi;
use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};
use crate::modules::auth::dto::*;
use crate::modules::auth::model::UserRole;
use crate::modules::transcode::dto::{SettingsRequest, UpdateStatusRequest};
use crate::modules::transcode::model::{Transcode, TranscodeStatus, UserSettings};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::register,
        crate::modules::auth::handler::login,
        crate::modules::auth::handler::logout,
        crate::modules::auth::handler::get_me,
        crate::modules::transcode::handler::list_transcodes,
        crate::modules::transcode::handler::update_status,
        crate::modules::transcode::handler::get_settings,
        crate::modules::transcode::handler::put_settings,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, UserResponse, UserRole,
            Transcode, TranscodeStatus, UserSettings,
            UpdateStatusRequest, SettingsRequest,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Transcode", description = "Transcode job records"),
        (name = "Settings", description = "Per-user settings")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
