//! Public wire shapes. Decimal values leave as plain JSON numbers and
//! timestamps as ISO-8601 UTC with millisecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::database::models::{History, User};

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub id: Uuid,
    pub user_id: String,
    #[serde(serialize_with = "iso_millis")]
    pub datetime: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl From<History> for HistoryView {
    fn from(h: History) -> Self {
        Self {
            id: h.id,
            user_id: h.user_id,
            datetime: h.datetime,
            value: h.value,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryTotal {
    pub total: f64,
}

/// The only user fields ever returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

pub fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
