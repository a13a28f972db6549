use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::migrations::system::{EMAIL_FIELD, PASSWORD_HASH_FIELD, ROLE_FIELD, USERNAME_FIELD};
use crate::modules::records::model::Record;
use crate::rules::{AuthContext, AuthUser};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    /// Anything but `ADMIN` is a regular user.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("ADMIN") => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => f.write_str("ADMIN"),
            UserRole::User => f.write_str("USER"),
        }
    }
}

/// Typed view over a record of the users collection.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn from_record(record: &Record) -> Self {
        let text = |field: &str| record.get_str(field).unwrap_or_default().to_string();
        Self {
            id: record.id.clone(),
            username: text(USERNAME_FIELD),
            email: text(EMAIL_FIELD),
            password_hash: text(PASSWORD_HASH_FIELD),
            role: UserRole::from_value(record.get_str(ROLE_FIELD)),
            created_at: record.created,
            updated_at: record.updated,
        }
    }

    /// The caller identity handed to rule evaluation. The password hash is
    /// never exposed to rules.
    pub fn auth_context(&self) -> AuthContext {
        let mut user = AuthUser::new(&self.id);
        user.fields.insert(USERNAME_FIELD.into(), Value::String(self.username.clone()));
        user.fields.insert(EMAIL_FIELD.into(), Value::String(self.email.clone()));
        user.fields.insert(ROLE_FIELD.into(), Value::String(self.role.to_string()));

        match self.role {
            UserRole::Admin => AuthContext::Admin(user),
            UserRole::User => AuthContext::User(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn role_decides_the_auth_context() {
        let mut data = Map::new();
        data.insert(USERNAME_FIELD.into(), json!("alice"));
        data.insert(PASSWORD_HASH_FIELD.into(), json!("$argon2id$..."));
        data.insert(ROLE_FIELD.into(), json!("ADMIN"));
        let record = Record::new("_pb_users_auth_", data);

        let user = User::from_record(&record);
        assert_eq!(user.role, UserRole::Admin);

        let auth = user.auth_context();
        assert!(auth.is_admin());
        assert_eq!(auth.field("username"), json!("alice"));
        assert_eq!(auth.field("passwordHash"), Value::Null);

        assert_eq!(UserRole::from_value(None), UserRole::User);
        assert_eq!(UserRole::from_value(Some("root")), UserRole::User);
    }
}
