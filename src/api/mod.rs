pub mod format;

pub use format::{HistoryTotal, HistoryView, UserView};
