//! Item store selection.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::database::DatabaseConfig;

/// Which store implementation backs the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents are lost on exit.
    #[default]
    Memory,
    /// PostgreSQL via `sqlx`.
    Postgres,
}

/// Item store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Connection settings, used when `backend = "postgres"`.
    #[serde(default)]
    pub database: DatabaseConfig,
}
