use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Profile row keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    #[sqlx(rename = "firebase_uid")]
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
