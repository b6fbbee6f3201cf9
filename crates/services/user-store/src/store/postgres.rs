//! Postgres document store over SeaORM.
//!
//! Every collection shares the `documents` table. Equality clauses compile to
//! JSONB containment on `body`, and `_id` clauses to the primary key.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgBinOper;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use common::AppResult;
use domain::document::set_path;
use domain::{Document, ID_FIELD};

use super::entities::document::{self, ActiveModel, Entity as DocumentEntity};
use super::{apply_update, DocumentStore, Filter, Projection, ReturnDocument};

/// Document store backed by a Postgres `documents` table
pub struct PgDocumentStore {
    db: DatabaseConnection,
}

impl PgDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn select(collection: &str, filter: &Filter) -> Select<DocumentEntity> {
        DocumentEntity::find()
            .filter(document::Column::Collection.eq(collection))
            .filter(filter_condition(filter))
            .order_by_asc(document::Column::CreatedAt)
    }

    fn select_by_id(collection: &str, id: Uuid) -> Select<DocumentEntity> {
        DocumentEntity::find_by_id(id).filter(document::Column::Collection.eq(collection))
    }
}

/// Compile a filter into a SQL condition.
///
/// An `_id` clause that is not a valid identity matches nothing.
pub(crate) fn filter_condition(filter: &Filter) -> Condition {
    let mut condition = Condition::all();
    let mut contained = Document::new();

    for (path, value) in filter.clauses() {
        if path == ID_FIELD {
            condition = match value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                Some(id) => condition.add(document::Column::Id.eq(id)),
                None => condition.add(Expr::cust("FALSE")),
            };
        } else {
            set_path(&mut contained, path, value.clone());
        }
    }

    if !contained.is_empty() {
        condition = condition.add(
            Expr::col((DocumentEntity, document::Column::Body))
                .binary(PgBinOper::Contains, Expr::val(Value::Object(contained))),
        );
    }

    condition
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Vec<Document>> {
        let models = Self::select(collection, filter).all(&self.db).await?;
        tracing::debug!(collection, count = models.len(), "find");

        Ok(models
            .into_iter()
            .map(|m| projection.apply(Document::from(m)))
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let model = Self::select(collection, filter).one(&self.db).await?;
        Ok(model.map(|m| projection.apply(Document::from(m))))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let model = Self::select_by_id(collection, id).one(&self.db).await?;
        Ok(model.map(|m| projection.apply(Document::from(m))))
    }

    async fn insert(&self, collection: &str, mut document: Document) -> AppResult<Document> {
        document.remove(ID_FIELD);
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            collection: Set(collection.to_string()),
            body: Set(Value::Object(document)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        tracing::debug!(collection, id = %model.id, "inserted document");
        Ok(Document::from(model))
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let txn = self.db.begin().await?;

        let Some(model) = Self::select(collection, filter)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Ok(None);
        };

        DocumentEntity::delete_by_id(model.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::debug!(collection, id = %model.id, "deleted document");
        Ok(Some(projection.apply(Document::from(model))))
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        update: Document,
        returning: ReturnDocument,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let txn = self.db.begin().await?;

        let Some(model) = Self::select_by_id(collection, id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Ok(None);
        };

        let before = Document::from(model.clone());
        let mut after = before.clone();
        apply_update(&mut after, &update);

        let mut body = after.clone();
        body.remove(ID_FIELD);

        let mut active: ActiveModel = model.into();
        active.body = Set(Value::Object(body));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        tracing::debug!(collection, %id, "updated document");
        let returned = match returning {
            ReturnDocument::Before => before,
            ReturnDocument::After => after,
        };
        Ok(Some(projection.apply(returned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};
    use serde_json::json;

    fn sql(filter: &Filter) -> String {
        PgDocumentStore::select("users", filter)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_empty_filter_only_scopes_collection() {
        let query = sql(&Filter::all());
        assert!(query.contains(r#""documents"."collection" = 'users'"#));
        assert!(!query.contains("@>"));
    }

    #[test]
    fn test_nested_clause_binds_containment_document() {
        let filter = Filter::eq("authentication.sessionToken", "tok");
        let statement = PgDocumentStore::select("users", &filter).build(DbBackend::Postgres);

        assert!(statement.sql.contains(r#""documents"."body" @> $2"#));
        assert!(!statement.sql.contains('?'));

        let values = statement.values.expect("bound values").0;
        let expected = json!({ "authentication": { "sessionToken": "tok" } });
        assert_eq!(
            values,
            vec![
                sea_orm::Value::from("users"),
                sea_orm::Value::Json(Some(Box::new(expected))),
            ]
        );
    }

    #[test]
    fn test_clauses_share_one_containment_document() {
        let statement = PgDocumentStore::select(
            "users",
            &Filter::eq("email", "a@x.io").and("_d", "legacy"),
        )
        .build(DbBackend::Postgres);

        let values = statement.values.expect("bound values").0;
        let expected = json!({ "email": "a@x.io", "_d": "legacy" });
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], sea_orm::Value::Json(Some(Box::new(expected))));
    }

    #[test]
    fn test_identity_clause_uses_primary_key() {
        let id = Uuid::new_v4();
        let query = sql(&Filter::eq(ID_FIELD, id.to_string()));
        assert!(query.contains(&id.to_string()));
        assert!(!query.contains("@>"));
    }

    #[test]
    fn test_invalid_identity_matches_nothing() {
        let query = sql(&Filter::eq(ID_FIELD, "not-a-uuid"));
        assert!(query.contains("FALSE"));
    }
}
