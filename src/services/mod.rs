pub mod history_service;
pub mod user_service;

pub use history_service::HistoryService;
pub use user_service::UserService;
