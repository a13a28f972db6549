use anyhow::Result;
use serde_json::Value;

use super::model::User;
use crate::infrastructure::store::Store;
use crate::migrations::system::{EMAIL_FIELD, USERNAME_FIELD};
use crate::schema::USERS_COLLECTION_ID;

pub struct AuthRepository;

impl AuthRepository {
    pub async fn find_user_by_id(store: &dyn Store, id: &str) -> Result<Option<User>> {
        let record = store.find_record(USERS_COLLECTION_ID, id).await?;
        Ok(record.as_ref().map(User::from_record))
    }

    pub async fn find_user_by_username(store: &dyn Store, username: &str) -> Result<Option<User>> {
        Self::find_by(store, USERNAME_FIELD, username).await
    }

    pub async fn find_user_by_email(store: &dyn Store, email: &str) -> Result<Option<User>> {
        Self::find_by(store, EMAIL_FIELD, email).await
    }

    async fn find_by(store: &dyn Store, field: &str, value: &str) -> Result<Option<User>> {
        let records = store
            .find_records_by_field(USERS_COLLECTION_ID, field, &Value::String(value.to_string()))
            .await?;
        Ok(records.first().map(User::from_record))
    }
}
