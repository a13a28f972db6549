use serde_json::{Map, Value};
use tracing::info;

use super::dto::{SettingsRequest, UpdateStatusRequest};
use super::model::{
    OWNER_FIELD, SETTINGS_FIELD, STATUS_FIELD, STATUS_MESSAGE_FIELD, Transcode, UserSettings,
};
use crate::modules::records::error::RecordError;
use crate::modules::records::model::Record;
use crate::modules::records::service::RecordService;
use crate::rules::AuthContext;
use crate::schema::{SETTINGS_COLLECTION, TRANSCODES_COLLECTION};
use crate::state::AppState;

pub struct TranscodeService;

impl TranscodeService {
    /// The caller's own transcodes, oldest first.
    pub async fn list_mine(state: AppState, auth: &AuthContext) -> Result<Vec<Transcode>, RecordError> {
        let collection = RecordService::collection(&state, TRANSCODES_COLLECTION).await?;
        let records = RecordService::list_all(&state, auth, &collection).await?;
        Ok(records
            .iter()
            .filter(|r| r.get_str(OWNER_FIELD) == auth.id())
            .map(Transcode::from_record)
            .collect())
    }

    /// Status hook for the transcoding engine.
    pub async fn update_status(
        state: AppState,
        auth: &AuthContext,
        id: &str,
        req: UpdateStatusRequest,
    ) -> Result<Transcode, RecordError> {
        let collection = RecordService::collection(&state, TRANSCODES_COLLECTION).await?;

        let mut input = Map::new();
        input.insert(STATUS_FIELD.into(), Value::String(req.status.as_str().to_string()));
        if let Some(message) = req.status_message {
            input.insert(STATUS_MESSAGE_FIELD.into(), Value::String(message));
        }

        let record = RecordService::update(&state, auth, &collection, id, &input).await?;
        info!(transcode = %record.id, status = req.status.as_str(), "Transcode status changed");
        Ok(Transcode::from_record(&record))
    }
}

pub struct SettingsService;

impl SettingsService {
    pub async fn get(state: AppState, auth: &AuthContext) -> Result<Option<UserSettings>, RecordError> {
        Ok(Self::find_own(&state, auth)
            .await?
            .as_ref()
            .map(UserSettings::from_record))
    }

    /// Creates the caller's settings record or replaces its document.
    pub async fn put(state: AppState, auth: &AuthContext, req: SettingsRequest) -> Result<UserSettings, RecordError> {
        let user_id = auth.id().ok_or(RecordError::Forbidden)?.to_string();
        let collection = RecordService::collection(&state, SETTINGS_COLLECTION).await?;

        let mut input = Map::new();
        input.insert(SETTINGS_FIELD.into(), req.settings);

        let record = match Self::find_own(&state, auth).await? {
            Some(existing) => RecordService::update(&state, auth, &collection, &existing.id, &input).await?,
            None => {
                input.insert(OWNER_FIELD.into(), Value::String(user_id));
                RecordService::create(&state, auth, &collection, &input).await?
            }
        };
        Ok(UserSettings::from_record(&record))
    }

    async fn find_own(state: &AppState, auth: &AuthContext) -> Result<Option<Record>, RecordError> {
        let collection = RecordService::collection(state, SETTINGS_COLLECTION).await?;
        let records = RecordService::list_all(state, auth, &collection).await?;
        Ok(records.into_iter().find(|r| r.get_str(OWNER_FIELD) == auth.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::transcode::model::TranscodeStatus;
    use crate::rules::AuthUser;
    use crate::test_support::{seed_user, test_state};
    use serde_json::json;

    fn user(id: &str) -> AuthContext {
        AuthContext::User(AuthUser::new(id))
    }

    #[tokio::test]
    async fn settings_are_created_once_then_replaced() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice", "USER").await;
        let bob = seed_user(&state, "bob", "USER").await;

        assert!(SettingsService::get(state.clone(), &user(&alice)).await.unwrap().is_none());

        let first = SettingsService::put(state.clone(), &user(&alice), SettingsRequest { settings: json!({ "theme": "dark" }) })
            .await
            .unwrap();
        let second = SettingsService::put(state.clone(), &user(&alice), SettingsRequest { settings: json!({ "theme": "light" }) })
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.user, alice);

        let stored = SettingsService::get(state.clone(), &user(&alice)).await.unwrap().unwrap();
        assert_eq!(stored.settings, json!({ "theme": "light" }));

        assert!(SettingsService::get(state.clone(), &user(&bob)).await.unwrap().is_none());
        assert!(matches!(
            SettingsService::put(state, &AuthContext::Guest, SettingsRequest { settings: json!({}) }).await,
            Err(RecordError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn status_hook_updates_the_record() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice", "USER").await;
        let transcodes = RecordService::collection(&state, TRANSCODES_COLLECTION).await.unwrap();
        let mut input = Map::new();
        input.insert("file_name".into(), json!("clip.mp4"));
        input.insert(OWNER_FIELD.into(), json!(alice));
        input.insert(STATUS_FIELD.into(), json!("in_progress"));
        let record = RecordService::create(&state, &user(&alice), &transcodes, &input).await.unwrap();

        let admin = AuthContext::Admin(AuthUser::new("root"));
        let updated = TranscodeService::update_status(
            state.clone(),
            &admin,
            &record.id,
            UpdateStatusRequest {
                status: TranscodeStatus::Error,
                status_message: Some("ffmpeg exited with 1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, Some(TranscodeStatus::Error));
        assert_eq!(updated.status_message, "ffmpeg exited with 1");

        let mine = TranscodeService::list_mine(state, &user(&alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, Some(TranscodeStatus::Error));
    }
}
