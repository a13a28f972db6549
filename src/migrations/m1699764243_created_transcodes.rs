use crate::schema::{Collection, RelationOptions, SchemaError, SchemaField, Schemas, USERS_COLLECTION_ID};

pub const TRANSCODES_ID: &str = "1oe3eocshms1c81";

pub fn up(schemas: &mut Schemas) -> Result<(), SchemaError> {
    let mut collection = Collection::base(TRANSCODES_ID, "transcodes", "2023-11-12 04:44:03.319Z");
    collection.schema.add_field(SchemaField::text("cbxzsgrq", "file_name"));
    collection.schema.add_field(SchemaField::json("emyxrjdg", "profiles"));
    collection.schema.add_field(SchemaField::relation(
        "xlojdfpl",
        "field",
        RelationOptions::single(USERS_COLLECTION_ID),
    ));

    schemas.save_collection(collection)
}

pub fn down(schemas: &mut Schemas) -> Result<(), SchemaError> {
    schemas.delete_collection(TRANSCODES_ID).map(|_| ())
}
