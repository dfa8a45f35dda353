pub mod config;

pub use config::{AppConfig, DartConfig, IndexConfig};
