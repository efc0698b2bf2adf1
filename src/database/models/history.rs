use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A single timestamped observation owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct History {
    pub id: Uuid,
    pub user_id: String,
    /// Event time supplied by the caller.
    pub datetime: DateTime<Utc>,
    pub value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
