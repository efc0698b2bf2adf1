mod health;
mod histories_total;

pub use health::{health, root};
pub use histories_total::histories_total;
