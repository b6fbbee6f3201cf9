//! User domain entity and its document schema.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::{
    AUTH_PASSWORD, AUTH_SALT, AUTH_SESSION_TOKEN, EMAIL, USERNAME, USER_MODEL,
};
use crate::document::{set_path, Document};
use crate::schema::{FieldSpec, Schema};

/// Schema of user documents.
///
/// Credentials are hidden from default reads; `password` is required on
/// creation together with `username` and `email`.
pub static USER_SCHEMA: Schema = Schema {
    name: USER_MODEL,
    fields: &[
        FieldSpec::text(USERNAME).required(),
        FieldSpec::text(EMAIL).required(),
        FieldSpec::text(AUTH_PASSWORD).required().hidden(),
        FieldSpec::text(AUTH_SALT).hidden(),
        FieldSpec::text(AUTH_SESSION_TOKEN).hidden(),
    ],
};

/// User domain entity, as read back from the store.
///
/// Which credential fields are populated depends on the projection used
/// for the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Authentication::is_empty"
    )]
    pub authentication: Authentication,
}

/// Credential record nested in a user document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl Authentication {
    /// True when no credential field was read
    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.salt.is_none() && self.session_token.is_none()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Typed builder for a user creation payload.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub salt: Option<String>,
    pub session_token: Option<String>,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            salt: None,
            session_token: None,
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Convert into the schemaless payload accepted by the repository
    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert(USERNAME.to_string(), Value::String(self.username));
        doc.insert(EMAIL.to_string(), Value::String(self.email));
        set_path(&mut doc, AUTH_PASSWORD, Value::String(self.password));
        if let Some(salt) = self.salt {
            set_path(&mut doc, AUTH_SALT, Value::String(salt));
        }
        if let Some(token) = self.session_token {
            set_path(&mut doc, AUTH_SESSION_TOKEN, Value::String(token));
        }
        doc
    }
}

impl From<NewUser> for Document {
    fn from(user: NewUser) -> Self {
        user.into_document()
    }
}
