//! Domain-level constants.
//!
//! Field paths and names shared by the schema, the projections and the
//! store adapters.

// =============================================================================
// Collection
// =============================================================================

/// Model name used in validation messages
pub const USER_MODEL: &str = "User";

/// Default collection holding user documents
pub const DEFAULT_USER_COLLECTION: &str = "users";

// =============================================================================
// Document paths
// =============================================================================

/// Identity field assigned by the store
pub const ID_FIELD: &str = "_id";

pub const USERNAME: &str = "username";

pub const EMAIL: &str = "email";

/// Nested record holding credentials
pub const AUTHENTICATION: &str = "authentication";

pub const AUTH_PASSWORD: &str = "authentication.password";

pub const AUTH_SALT: &str = "authentication.salt";

pub const AUTH_SESSION_TOKEN: &str = "authentication.sessionToken";

/// Paths hidden from default reads
pub const CREDENTIAL_PATHS: &[&str] = &[AUTH_PASSWORD, AUTH_SALT, AUTH_SESSION_TOKEN];

/// Misspelled identity key the legacy delete filter targets.
///
/// No document ever carries this key, so a filter on it never matches.
pub const LEGACY_DELETE_KEY: &str = "_d";
