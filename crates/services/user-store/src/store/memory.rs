//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::AppResult;
use domain::{Document, ID_FIELD};

use super::{apply_update, DocumentStore, Filter, Projection, ReturnDocument};

/// Document store keeping every collection in memory.
///
/// Documents are kept in insertion order, which is the iteration order of
/// `find`.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_filter(id: Uuid) -> Filter {
        Filter::eq(ID_FIELD, id.to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.matches(d))
                    .map(|d| projection.apply(d.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .map(|d| projection.apply(d.clone())))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        self.find_one(collection, &Self::id_filter(id), projection)
            .await
    }

    async fn insert(&self, collection: &str, mut document: Document) -> AppResult<Document> {
        let id = Uuid::new_v4();
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        tracing::debug!(collection, %id, "inserted document");
        Ok(document)
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                let removed = docs.remove(index);
                tracing::debug!(collection, "deleted document");
                Ok(Some(projection.apply(removed)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        update: Document,
        returning: ReturnDocument,
        projection: Projection,
    ) -> AppResult<Option<Document>> {
        let filter = Self::id_filter(id);
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(None);
        };

        let before = doc.clone();
        apply_update(doc, &update);
        tracing::debug!(collection, %id, "updated document");

        let returned = match returning {
            ReturnDocument::Before => before,
            ReturnDocument::After => doc.clone(),
        };
        Ok(Some(projection.apply(returned)))
    }
}
