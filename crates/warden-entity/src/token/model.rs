//! One-time download token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A short-lived, single-use capability for downloading one wrapped
/// binary, so download URLs never embed long-lived credentials.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DownloadToken {
    /// Unique token record identifier.
    pub id: Uuid,
    /// Binary this token downloads.
    pub binary_id: Uuid,
    /// Opaque token material (base64url of random bytes).
    pub token: String,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// When the token was redeemed (None = still unused).
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl DownloadToken {
    /// Whether the token can still be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && now <= self.expires_at
    }
}
