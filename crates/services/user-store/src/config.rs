//! User store configuration.

use std::env;

use common::{DatabaseConfig, ServiceConfig};
use domain::DEFAULT_USER_COLLECTION;

use crate::repository::DeleteMatch;

/// User store configuration.
#[derive(Debug, Clone)]
pub struct UserStoreConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    /// Collection holding user documents
    pub collection: String,
    pub delete_match: DeleteMatch,
}

impl UserStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database = DatabaseConfig {
            url: lookup("USER_STORE_DATABASE_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(defaults.database.url),
            connect_timeout_secs: lookup("USER_STORE_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.database.connect_timeout_secs),
        };

        let service = ServiceConfig {
            service_name: defaults.service.service_name,
            log_level: lookup("USER_STORE_LOG_LEVEL").unwrap_or(defaults.service.log_level),
        };

        let delete_match = match lookup("USER_STORE_DELETE_BY_IDENTITY").as_deref().map(parse_flag) {
            Some(true) => DeleteMatch::Identity,
            _ => DeleteMatch::LegacyKey,
        };

        Self {
            service,
            database,
            collection: lookup("USER_STORE_COLLECTION")
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.collection),
            delete_match,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                service_name: "user-store".to_string(),
                log_level: "info".to_string(),
            },
            database: DatabaseConfig::default(),
            collection: DEFAULT_USER_COLLECTION.to_string(),
            delete_match: DeleteMatch::LegacyKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> UserStoreConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        UserStoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.collection, "users");
        assert_eq!(config.delete_match, DeleteMatch::LegacyKey);
        assert_eq!(config.database.url, DatabaseConfig::default().url);
    }

    #[test]
    fn test_service_url_takes_precedence() {
        let config = config(&[
            ("DATABASE_URL", "postgres://shared"),
            ("USER_STORE_DATABASE_URL", "postgres://dedicated"),
        ]);
        assert_eq!(config.database.url, "postgres://dedicated");
    }

    #[test]
    fn test_delete_by_identity_flag() {
        assert_eq!(
            config(&[("USER_STORE_DELETE_BY_IDENTITY", "TRUE")]).delete_match,
            DeleteMatch::Identity
        );
        assert_eq!(
            config(&[("USER_STORE_DELETE_BY_IDENTITY", "no")]).delete_match,
            DeleteMatch::LegacyKey
        );
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = config(&[("USER_STORE_CONNECT_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.database.connect_timeout_secs, 8);
    }
}
