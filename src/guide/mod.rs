pub mod scanner;
pub mod types;

pub use scanner::{scan_lines, GuideScanner};
pub use types::GuideEntry;
