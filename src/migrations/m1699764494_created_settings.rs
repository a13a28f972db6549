use crate::schema::{
    Collection, OWNER_RULE, RelationOptions, SchemaError, SchemaField, Schemas, USERS_COLLECTION_ID,
};

pub const SETTINGS_ID: &str = "hg75p2k9q083hdp";

pub fn up(schemas: &mut Schemas) -> Result<(), SchemaError> {
    let mut collection = Collection::base(SETTINGS_ID, "settings", "2023-11-12 04:48:14.036Z");
    collection.schema.add_field(SchemaField::json("ncg79x1f", "settings"));
    collection.schema.add_field(SchemaField::relation(
        "6ttqjv5d",
        "user",
        RelationOptions::single(USERS_COLLECTION_ID),
    ));
    collection.set_all_rules(Some(OWNER_RULE));

    schemas.save_collection(collection)
}

pub fn down(schemas: &mut Schemas) -> Result<(), SchemaError> {
    schemas.delete_collection(SETTINGS_ID).map(|_| ())
}
