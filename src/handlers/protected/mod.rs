pub mod histories;
pub mod users;
