//! Wayfarer RPG: PostgreSQL persistence.
//!
//! Implements the game crate's [`GameRepository`](wayfarer_game::domain::repository::GameRepository)
//! and [`CatalogRepository`](wayfarer_game::domain::repository::CatalogRepository)
//! over a shared `PgPool`. Queries are checked at runtime; no database is
//! needed to build.

pub mod pg_catalog_repository;
pub mod pg_game_repository;
mod rows;
pub mod schema;
