//! Document store port and adapters.
//!
//! The repository layer talks to a [`DocumentStore`]: a collection-scoped
//! client with single-document lookups, inserts, deletes and updates.
//! Two adapters ship with the crate: [`MemoryStore`] and [`PgDocumentStore`].

pub(crate) mod entities;
mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use common::AppResult;
use domain::document::{get_path, remove_path, set_path};
use domain::{Document, ID_FIELD};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Conjunction of exact-equality clauses on dotted paths.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Match every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Match documents whose `path` equals `value`
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(path, value)
    }

    pub fn and(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((path.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(path, value)| get_path(doc, path) == Some(value))
    }
}

/// Subset of fields returned by a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Every stored field
    All,
    /// Every stored field except the listed paths
    Exclude(&'static [&'static str]),
}

impl Projection {
    pub fn apply(&self, mut doc: Document) -> Document {
        if let Projection::Exclude(paths) = self {
            for path in paths.iter() {
                remove_path(&mut doc, path);
            }
        }
        doc
    }
}

/// Which version of the document an update returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    /// The document as it was before the update
    #[default]
    Before,
    After,
}

/// Apply `$set`-style path assignments; the identity field is immutable.
pub(crate) fn apply_update(doc: &mut Document, update: &Document) {
    for (path, value) in update {
        if path == ID_FIELD {
            continue;
        }
        set_path(doc, path, value.clone());
    }
}

/// Collection-scoped document store client.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`, in store iteration order
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Vec<Document>>;

    /// First document matching `filter`
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>>;

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
        projection: Projection,
    ) -> AppResult<Option<Document>>;

    /// Persist a new document under a fresh identity.
    ///
    /// Returns the stored document with its `_id`, unprojected.
    async fn insert(&self, collection: &str, document: Document) -> AppResult<Document>;

    /// Remove the first document matching `filter` and return it
    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Projection,
    ) -> AppResult<Option<Document>>;

    /// Apply `update` to the document with identity `id`
    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        update: Document,
        returning: ReturnDocument,
        projection: Projection,
    ) -> AppResult<Option<Document>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_filter_matches_nested_path() {
        let d = doc(json!({ "email": "a@x.io", "authentication": { "sessionToken": "t1" } }));
        assert!(Filter::all().matches(&d));
        assert!(Filter::eq("authentication.sessionToken", "t1").matches(&d));
        assert!(!Filter::eq("authentication.sessionToken", "t2").matches(&d));
        assert!(!Filter::eq("email", "a@x.io").and("_d", "x").matches(&d));
    }

    #[test]
    fn test_projection_exclude_removes_only_listed_paths() {
        let d = doc(json!({ "email": "a@x.io", "authentication": { "password": "p", "salt": "s" } }));
        let projected = Projection::Exclude(&["authentication.password"]).apply(d.clone());
        assert_eq!(projected, doc(json!({ "email": "a@x.io", "authentication": { "salt": "s" } })));
        assert_eq!(Projection::All.apply(d.clone()), d);
    }

    #[test]
    fn test_apply_update_ignores_identity() {
        let mut d = doc(json!({ "_id": "abc", "username": "old" }));
        apply_update(&mut d, &doc(json!({ "_id": "zzz", "username": "new" })));
        assert_eq!(d, doc(json!({ "_id": "abc", "username": "new" })));
    }
}
