//! Database schema.
//!
//! The DDL lives in the workspace `migrations/` directory and is embedded
//! here so the binary can migrate on startup.

use sqlx::migrate::Migrator;

/// Every migration under `migrations/`, in version order.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
