//! Domain layer - Core entities and schema declarations.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the `User` entity, the schema that governs user documents, and the
//! dotted-path helpers shared by every store adapter.

pub mod constants;
pub mod document;
pub mod error;
pub mod schema;
pub mod user;

pub use constants::*;
pub use document::Document;
pub use error::{DomainError, DomainResult};
pub use schema::{FieldSpec, Schema};
pub use user::{Authentication, NewUser, User, USER_SCHEMA};
