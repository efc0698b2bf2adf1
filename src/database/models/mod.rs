pub mod history;
pub mod user;

pub use history::History;
pub use user::User;
