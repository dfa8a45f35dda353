use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;

const BAR_TEMPLATE: &str = "{prefix:>6} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// One labelled bar, hidden when no `MultiProgress` is attached.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(multi_progress: Option<&Arc<MultiProgress>>, label: &str, total: u64) -> Self {
        let bar = match multi_progress {
            Some(mp) => {
                let pb = mp.add(ProgressBar::new(total));
                if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => ProgressBar::hidden(),
        };
        bar.set_prefix(label.to_string());
        Self { bar }
    }

    pub fn hidden(label: &str) -> Self {
        Self::new(None, label, 0)
    }

    pub fn start(&self, total: u64, message: &str) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message(message.to_string());
    }

    pub fn increment(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// The three bars shown while ingesting: current folder, overall files
/// and indexed documents.
#[derive(Clone)]
pub struct IngestProgress {
    pub dir: ProgressTracker,
    pub total: ProgressTracker,
    pub index: ProgressTracker,
}

impl IngestProgress {
    pub fn new(multi_progress: Option<&Arc<MultiProgress>>) -> Self {
        Self {
            dir: ProgressTracker::new(multi_progress, "DIR", 0),
            total: ProgressTracker::new(multi_progress, "TOTAL", 0),
            index: ProgressTracker::new(multi_progress, "INDEX", 0),
        }
    }

    pub fn hidden() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bars_still_count() {
        let progress = IngestProgress::hidden();
        progress.total.start(10, "files");
        progress.total.increment(3);
        assert_eq!(progress.total.position(), 3);
        progress.total.finish("done");
    }
}
