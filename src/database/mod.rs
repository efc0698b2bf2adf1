pub mod manager;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{HealthCheck, HistoryStore, UserStore};
