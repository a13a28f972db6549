use crate::schema::{
    Collection, CollectionType, SchemaError, SchemaField, Schemas, SelectOptions, USERS_COLLECTION,
    USERS_COLLECTION_ID,
};

use super::Migration;

pub const USERNAME_FIELD: &str = "username";
pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_HASH_FIELD: &str = "passwordHash";
pub const ROLE_FIELD: &str = "role";

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        file: "1640988000_init_users",
        up: init_users_up,
        down: init_users_down,
    }]
}

fn init_users_up(schemas: &mut Schemas) -> Result<(), SchemaError> {
    let mut users = Collection::base(USERS_COLLECTION_ID, USERS_COLLECTION, "2022-01-01 00:00:00.000Z");
    users.kind = CollectionType::Auth;
    users.system = true;
    users.schema.add_field(SchemaField::text("users_name", USERNAME_FIELD).system().required().unique());
    users.schema.add_field(SchemaField::text("users_mail", EMAIL_FIELD).system().unique());
    users.schema.add_field(SchemaField::text("users_hash", PASSWORD_HASH_FIELD).system().required().hidden());
    users.schema.add_field(
        SchemaField::select("users_role", ROLE_FIELD, SelectOptions::single(&["USER", "ADMIN"])).system(),
    );
    users.list_rule = Some("id = @request.auth.id".into());
    users.view_rule = Some("id = @request.auth.id".into());

    schemas.save_collection(users)
}

fn init_users_down(_schemas: &mut Schemas) -> Result<(), SchemaError> {
    Err(SchemaError::SystemCollection(USERS_COLLECTION.into()))
}
