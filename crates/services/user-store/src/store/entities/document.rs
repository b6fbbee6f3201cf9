//! Stored document entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value;

use domain::{Document, ID_FIELD};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Collection the document belongs to
    pub collection: String,
    /// Document fields, without the identity
    #[sea_orm(column_type = "JsonBinary")]
    pub body: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert a stored row back into a document carrying its `_id`
impl From<Model> for Document {
    fn from(model: Model) -> Self {
        let mut doc = match model.body {
            Value::Object(map) => map,
            _ => Document::new(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(model.id.to_string()));
        doc
    }
}
