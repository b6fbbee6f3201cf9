//! User repository over a document store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    Document, User, AUTH_SESSION_TOKEN, CREDENTIAL_PATHS, DEFAULT_USER_COLLECTION, EMAIL, ID_FIELD,
    LEGACY_DELETE_KEY, USER_SCHEMA,
};

use crate::store::{DocumentStore, Filter, Projection, ReturnDocument};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Default read view: credentials are omitted.
pub const PUBLIC_VIEW: Projection = Projection::Exclude(CREDENTIAL_PATHS);

/// Read view that includes credentials.
pub const FULL_VIEW: Projection = Projection::All;

/// Key the delete operation filters on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMatch {
    /// Filter on the misspelled `_d` key: matches nothing, deletes nothing.
    #[default]
    LegacyKey,
    /// Filter on the document identity
    Identity,
}

/// User repository trait for dependency injection.
///
/// Reads take the projection to apply; use [`PUBLIC_VIEW`] unless the
/// caller needs credentials. Misses are `None`, not errors.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List every user in store order
    async fn list_users(&self, view: Projection) -> AppResult<Vec<User>>;

    /// First user with exactly this email
    async fn get_user_by_email(&self, email: &str, view: Projection) -> AppResult<Option<User>>;

    /// User holding this session token
    async fn get_user_by_session_token(
        &self,
        token: &str,
        view: Projection,
    ) -> AppResult<Option<User>>;

    async fn get_user_by_id(&self, id: Uuid, view: Projection) -> AppResult<Option<User>>;

    /// Validate and persist a new user, returning it with credentials
    async fn create_user(&self, fields: Document) -> AppResult<User>;

    /// Delete a user and return it (public view)
    async fn delete_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Apply a partial update and return the user as it was before it
    async fn update_user_by_id(&self, id: Uuid, fields: Document) -> AppResult<Option<User>>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
    collection: String,
    delete_match: DeleteMatch,
}

impl UserStore {
    /// Create a repository on the default collection
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: DEFAULT_USER_COLLECTION.to_string(),
            delete_match: DeleteMatch::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_delete_match(mut self, delete_match: DeleteMatch) -> Self {
        self.delete_match = delete_match;
        self
    }

    fn delete_filter(&self, id: Uuid) -> Filter {
        match self.delete_match {
            DeleteMatch::LegacyKey => {
                tracing::warn!(
                    %id,
                    key = LEGACY_DELETE_KEY,
                    "delete filters on legacy key; no document will be removed"
                );
                Filter::eq(LEGACY_DELETE_KEY, id.to_string())
            }
            DeleteMatch::Identity => Filter::eq(ID_FIELD, id.to_string()),
        }
    }
}

fn to_user(doc: Document) -> AppResult<User> {
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| AppError::internal(format!("malformed user document: {}", e)))
}

fn to_optional_user(doc: Option<Document>) -> AppResult<Option<User>> {
    doc.map(to_user).transpose()
}

#[async_trait]
impl UserRepository for UserStore {
    async fn list_users(&self, view: Projection) -> AppResult<Vec<User>> {
        let docs = self
            .store
            .find(&self.collection, &Filter::all(), view)
            .await?;

        docs.into_iter().map(to_user).collect()
    }

    async fn get_user_by_email(&self, email: &str, view: Projection) -> AppResult<Option<User>> {
        let doc = self
            .store
            .find_one(&self.collection, &Filter::eq(EMAIL, email), view)
            .await?;

        to_optional_user(doc)
    }

    async fn get_user_by_session_token(
        &self,
        token: &str,
        view: Projection,
    ) -> AppResult<Option<User>> {
        let doc = self
            .store
            .find_one(&self.collection, &Filter::eq(AUTH_SESSION_TOKEN, token), view)
            .await?;

        to_optional_user(doc)
    }

    async fn get_user_by_id(&self, id: Uuid, view: Projection) -> AppResult<Option<User>> {
        let doc = self.store.find_by_id(&self.collection, id, view).await?;
        to_optional_user(doc)
    }

    async fn create_user(&self, fields: Document) -> AppResult<User> {
        let doc = USER_SCHEMA.cast_new(fields)?;
        let stored = self.store.insert(&self.collection, doc).await?;
        to_user(stored)
    }

    async fn delete_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let filter = self.delete_filter(id);
        let doc = self
            .store
            .find_one_and_delete(&self.collection, &filter, PUBLIC_VIEW)
            .await?;

        to_optional_user(doc)
    }

    async fn update_user_by_id(&self, id: Uuid, fields: Document) -> AppResult<Option<User>> {
        let update = USER_SCHEMA.cast_update(fields)?;
        let doc = self
            .store
            .find_by_id_and_update(
                &self.collection,
                id,
                update,
                ReturnDocument::Before,
                PUBLIC_VIEW,
            )
            .await?;

        to_optional_user(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockDocumentStore;
    use sea_orm::{DbErr, RuntimeErr};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn stored_user(id: Uuid) -> Document {
        doc(json!({
            "_id": id.to_string(),
            "username": "alice",
            "email": "alice@example.com",
            "authentication": {}
        }))
    }

    fn repo(store: MockDocumentStore) -> UserStore {
        UserStore::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_list_users_propagates_unavailable_store() {
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(|_, _, _| {
            Err(AppError::from(DbErr::Conn(RuntimeErr::Internal(
                "connection refused".into(),
            ))))
        });

        let result = repo(store).list_users(PUBLIC_VIEW).await;

        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_session_token_lookup_filters_on_nested_path() {
        let id = Uuid::new_v4();
        let mut store = MockDocumentStore::new();
        store
            .expect_find_one()
            .withf(|collection, filter, view| {
                collection == "users"
                    && filter.clauses() == [(AUTH_SESSION_TOKEN.to_string(), json!("tok"))]
                    && *view == PUBLIC_VIEW
            })
            .returning(move |_, _, _| Ok(Some(stored_user(id))));

        let user = repo(store)
            .get_user_by_session_token("tok", PUBLIC_VIEW)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_empty_session_token_is_matched_by_store() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_one()
            .withf(|_, filter, _| {
                filter.clauses() == [(AUTH_SESSION_TOKEN.to_string(), json!(""))]
            })
            .times(1)
            .returning(|_, _, _| Ok(None));

        let result = repo(store).get_user_by_session_token("", PUBLIC_VIEW).await;

        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_create_user_rejects_missing_email_before_insert() {
        let store = MockDocumentStore::new();
        let fields = doc(json!({
            "username": "alice",
            "authentication": { "password": "hash" }
        }));

        let result = repo(store).create_user(fields).await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("email is required")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_uses_legacy_key_by_default() {
        let id = Uuid::new_v4();
        let mut store = MockDocumentStore::new();
        store
            .expect_find_one_and_delete()
            .withf(move |_, filter, view| {
                filter.clauses() == [(LEGACY_DELETE_KEY.to_string(), json!(id.to_string()))]
                    && *view == PUBLIC_VIEW
            })
            .returning(|_, _, _| Ok(None));

        let result = repo(store).delete_user_by_id(id).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_identity_when_configured() {
        let id = Uuid::new_v4();
        let mut store = MockDocumentStore::new();
        store
            .expect_find_one_and_delete()
            .withf(move |_, filter, _| {
                filter.clauses() == [(ID_FIELD.to_string(), json!(id.to_string()))]
            })
            .returning(move |_, _, _| Ok(Some(stored_user(id))));

        let deleted = repo(store)
            .with_delete_match(DeleteMatch::Identity)
            .delete_user_by_id(id)
            .await
            .unwrap();

        assert_eq!(deleted.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn test_update_requests_pre_update_document() {
        let id = Uuid::new_v4();
        let mut store = MockDocumentStore::new();
        store
            .expect_find_by_id_and_update()
            .withf(move |collection, target, update, returning, view| {
                collection == "people"
                    && *target == id
                    && update == &doc(json!({ "username": "bob" }))
                    && *returning == ReturnDocument::Before
                    && *view == PUBLIC_VIEW
            })
            .returning(move |_, _, _, _, _| Ok(Some(stored_user(id))));

        let before = repo(store)
            .with_collection("people")
            .update_user_by_id(id, doc(json!({ "username": "bob", "role": "admin" })))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(before.username, "alice");
    }

    #[tokio::test]
    async fn test_malformed_document_is_internal_error() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_by_id()
            .returning(|_, _, _| Ok(Some(doc(json!({ "_id": "not-a-uuid" })))));

        let result = repo(store).get_user_by_id(Uuid::new_v4(), FULL_VIEW).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
