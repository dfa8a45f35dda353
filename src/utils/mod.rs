pub mod encoding;
pub mod jsonl;
pub mod progress;
pub mod retry;

pub use encoding::{decode_bytes, read_text_file};
pub use jsonl::JsonlWriter;
pub use progress::{IngestProgress, ProgressTracker};
pub use retry::RetryPolicy;
