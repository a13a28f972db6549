pub mod app;
pub mod cli;
pub mod common;
pub mod config;
pub mod docs;
pub mod infrastructure;
pub mod middleware;
pub mod migrations;
pub mod modules;
pub mod notify;
pub mod routes;
pub mod rules;
pub mod schema;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::{Map, Value};

    use crate::config::settings::AppConfig;
    use crate::infrastructure::store::{MemoryStore, Store};
    use crate::migrations::Migrator;
    use crate::migrations::system::{PASSWORD_HASH_FIELD, ROLE_FIELD, USERNAME_FIELD};
    use crate::modules::records::service::RecordService;
    use crate::schema::USERS_COLLECTION_ID;
    use crate::state::AppState;

    pub fn test_config() -> AppConfig {
        AppConfig {
            server_port: 0,
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
            cookie_secure: false,
            auto_migrate: true,
        }
    }

    /// Fully migrated in-memory state.
    pub async fn test_state() -> AppState {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Migrator::new(store.clone()).up().await.unwrap();
        AppState::new(test_config(), store)
    }

    /// Inserts a user directly and returns its id. The hash is not a real
    /// argon2 hash, so these users cannot log in.
    pub async fn seed_user(state: &AppState, username: &str, role: &str) -> String {
        let users = RecordService::collection(state, USERS_COLLECTION_ID).await.unwrap();
        let mut data = Map::new();
        data.insert(USERNAME_FIELD.into(), Value::String(username.into()));
        data.insert(PASSWORD_HASH_FIELD.into(), Value::String("x".into()));
        data.insert(ROLE_FIELD.into(), Value::String(role.into()));
        RecordService::insert_trusted(state, &users, &data).await.unwrap().id
    }
}
