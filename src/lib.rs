pub mod core;
pub mod dart;
pub mod guide;
pub mod ingest;
pub mod search;
pub mod utils;

pub use crate::core::config::AppConfig;
pub use utils::progress::ProgressTracker;
