use crate::schema::{
    OWNER_RULE, RelationOptions, SchemaError, SchemaField, Schemas, SelectOptions, USERS_COLLECTION_ID,
};

use super::m1699764243_created_transcodes::TRANSCODES_ID;

pub fn up(schemas: &mut Schemas) -> Result<(), SchemaError> {
    let mut collection = schemas.find_collection_by_name_or_id(TRANSCODES_ID)?.clone();

    collection.set_all_rules(Some(OWNER_RULE));

    collection.schema.add_field(SchemaField::select(
        "3hmxoumw",
        "status",
        SelectOptions::single(&["in_progress", "complete", "error"]),
    ));
    collection.schema.add_field(SchemaField::text("y2zg4gvu", "status_message"));
    // rename of the owner relation
    collection.schema.add_field(SchemaField::relation(
        "xlojdfpl",
        "user",
        RelationOptions::single(USERS_COLLECTION_ID),
    ));

    schemas.save_collection(collection)
}

pub fn down(schemas: &mut Schemas) -> Result<(), SchemaError> {
    let mut collection = schemas.find_collection_by_name_or_id(TRANSCODES_ID)?.clone();

    collection.set_all_rules(None);

    collection.schema.remove_field("3hmxoumw")?;
    collection.schema.remove_field("y2zg4gvu")?;
    collection.schema.add_field(SchemaField::relation(
        "xlojdfpl",
        "field",
        RelationOptions::single(USERS_COLLECTION_ID),
    ));

    schemas.save_collection(collection)
}
