//! User Store Library
//!
//! This crate provides the user-record access layer: a repository of `User`
//! documents over a pluggable document store. The Postgres adapter is used
//! by the `user-store` binary; the in-memory adapter serves tests and
//! embedding.

pub mod config;
pub mod infra;
pub mod repository;
pub mod store;

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use common::AppResult;
use domain::User;

use crate::config::UserStoreConfig;
use crate::infra::Database;
use crate::repository::{UserRepository, UserStore};
use crate::store::{PgDocumentStore, Projection};

/// Connect to Postgres and build the user repository.
pub async fn connect_repository(config: &UserStoreConfig) -> AppResult<Arc<dyn UserRepository>> {
    let db = Database::connect(&config.database).await?;
    let store = Arc::new(PgDocumentStore::new(db.get_connection()));

    let repo = UserStore::new(store)
        .with_collection(config.collection.clone())
        .with_delete_match(config.delete_match);
    info!(collection = %config.collection, delete_match = ?config.delete_match, "User repository ready");

    Ok(Arc::new(repo))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> AppResult<()> {
    let config = UserStoreConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Read-only user lookup for operators.
#[derive(Debug, Clone)]
pub enum UserQuery {
    List,
    ById(Uuid),
    ByEmail(String),
}

/// Run a lookup against the repository.
pub async fn run_query(
    repo: &dyn UserRepository,
    query: UserQuery,
    view: Projection,
) -> AppResult<Vec<User>> {
    match query {
        UserQuery::List => repo.list_users(view).await,
        UserQuery::ById(id) => Ok(repo.get_user_by_id(id, view).await?.into_iter().collect()),
        UserQuery::ByEmail(email) => Ok(repo
            .get_user_by_email(&email, view)
            .await?
            .into_iter()
            .collect()),
    }
}
