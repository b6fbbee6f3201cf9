//! SeaORM entities backing the Postgres adapter.

pub mod document;
