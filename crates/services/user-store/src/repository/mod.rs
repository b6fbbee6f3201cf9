//! Repository layer for user records.

mod user_repository;

pub use user_repository::{DeleteMatch, UserRepository, UserStore, FULL_VIEW, PUBLIC_VIEW};

#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
