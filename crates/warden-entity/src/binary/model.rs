//! Protected binary entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A protected artifact that licenses attach to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Binary {
    /// Unique binary identifier.
    pub id: Uuid,
    /// Human-readable name (original filename).
    pub name: String,
    /// Size of the unprotected input in bytes.
    pub original_size: i64,
    /// Size of the wrapped output in bytes.
    pub wrapped_size: i64,
    /// Path of the wrapped artifact relative to the data root.
    #[serde(skip_serializing)]
    pub artifact_path: String,
    /// When the binary was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the binary was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Binary row joined with its derived license count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BinarySummary {
    /// Unique binary identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Size of the unprotected input in bytes.
    pub original_size: i64,
    /// Size of the wrapped output in bytes.
    pub wrapped_size: i64,
    /// Number of licenses attached to this binary.
    pub license_count: i64,
    /// When the binary was uploaded.
    pub created_at: DateTime<Utc>,
}
